use joyeria_types::{Order, OrderStatus, Role};

use crate::OrderError;

/// Operator actions on a single order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderAction {
    /// `solicitado → descargado`.
    Download,
    /// `descargado → capturado`.
    Capture,
    /// Admin reassignment to any status.
    SetStatus(OrderStatus),
    /// Admin only. Sets the `cancelado` flag.
    Cancel,
    /// Admin only. Clears the `cancelado` flag.
    Reactivate,
    /// Terminal; asks for confirmation.
    Delete,
}

impl OrderAction {
    pub fn name(&self) -> &'static str {
        match self {
            OrderAction::Download => "descargar",
            OrderAction::Capture => "capturar",
            OrderAction::SetStatus(_) => "cambiar estado",
            OrderAction::Cancel => "cancelar",
            OrderAction::Reactivate => "reactivar",
            OrderAction::Delete => "eliminar",
        }
    }

    pub fn allowed_roles(&self) -> &'static [Role] {
        match self {
            OrderAction::Download | OrderAction::Capture => &[Role::Admin, Role::Vendedor],
            _ => &[Role::Admin],
        }
    }

    pub fn needs_confirmation(&self) -> bool {
        matches!(self, OrderAction::Delete)
    }

    /// The status this action sends, if it changes status at all.
    ///
    /// Shortcuts are only offered from their source status, so they are
    /// refused for orders elsewhere in the workflow.
    pub fn target_status(&self, order: &Order) -> Result<Option<OrderStatus>, OrderError> {
        let shortcut = |from: OrderStatus, to: OrderStatus| {
            if order.estado == from {
                Ok(Some(to))
            } else {
                Err(OrderError::InvalidTransition {
                    id: order.id.clone(),
                    action: self.name(),
                    estado: order.estado,
                })
            }
        };
        match self {
            OrderAction::Download => shortcut(OrderStatus::Solicitado, OrderStatus::Descargado),
            OrderAction::Capture => shortcut(OrderStatus::Descargado, OrderStatus::Capturado),
            OrderAction::SetStatus(to) => Ok(Some(*to)),
            OrderAction::Cancel | OrderAction::Reactivate | OrderAction::Delete => Ok(None),
        }
    }
}
