//! Order lifecycle: dashboard tabs, operator actions and the reloading
//! order board.
//!
//! Orders move `solicitado → descargado → capturado`. Cancellation is a
//! separate flag and never changes `estado`. The backend is authoritative:
//! after any action the board refetches the whole list.

pub mod actions;
pub mod board;
pub mod tabs;

use joyeria_client::ApiError;
use joyeria_types::OrderStatus;
use thiserror::Error;

pub use actions::OrderAction;
pub use board::OrderBoard;
pub use tabs::{filter, Audience, Tab};

#[derive(Debug, Error)]
pub enum OrderError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("cannot {action} order {id}: it is {estado}")]
    InvalidTransition {
        id: String,
        action: &'static str,
        estado: OrderStatus,
    },

    #[error("order not found: {0}")]
    NotFound(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The action went through but the list could not be refreshed.
    #[error("order updated, but reloading the list failed: {0}")]
    Stale(#[source] ApiError),
}
