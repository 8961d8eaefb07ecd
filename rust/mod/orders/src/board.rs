use joyeria_auth::Session;
use joyeria_client::{ApiClient, ApiError};
use joyeria_types::{Confirm, Order, Outcome, StatusChange};
use tracing::{debug, info, warn};

use crate::actions::OrderAction;
use crate::tabs::{filter, Audience, Tab};
use crate::OrderError;

/// The order list behind a dashboard.
///
/// Every mutation is followed by a full reload from the backend; the list
/// is never patched locally. Each fetch is numbered and only the newest
/// issued fetch may replace the list, so a slow older response can't
/// overwrite a fresher one.
pub struct OrderBoard {
    api: ApiClient,
    session: Session,
    audience: Audience,
    client_filter: Option<String>,
    orders: Vec<Order>,
    issued: u64,
    applied: u64,
}

impl OrderBoard {
    /// Board for the session's dashboard. Only admins and vendors have one.
    pub fn new(api: ApiClient, session: Session) -> Result<Self, OrderError> {
        let audience = session
            .role
            .and_then(Audience::for_role)
            .ok_or_else(|| OrderError::Forbidden("no order dashboard for this role".to_string()))?;
        Ok(Self {
            api,
            session,
            audience,
            client_filter: None,
            orders: Vec::new(),
            issued: 0,
            applied: 0,
        })
    }

    /// Narrow the admin board to one client's orders. Ignored for vendors,
    /// whose endpoint is already scoped.
    pub fn with_client(mut self, client_id: Option<String>) -> Self {
        self.client_filter = client_id;
        self
    }

    pub fn audience(&self) -> Audience {
        self.audience
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn find(&self, id: &str) -> Option<&Order> {
        self.orders.iter().find(|o| o.id == id)
    }

    pub fn tab(&self, tab: Tab) -> Vec<&Order> {
        filter(self.audience, tab, &self.orders)
    }

    /// Per-tab totals, in tab order.
    pub fn counts(&self) -> Vec<(Tab, usize)> {
        self.audience
            .tabs()
            .iter()
            .map(|&t| (t, self.tab(t).len()))
            .collect()
    }

    /// Number a new fetch.
    pub fn begin_fetch(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    /// Install the result of fetch `generation` unless a newer fetch was
    /// issued since. Returns whether the list changed.
    pub fn finish_fetch(&mut self, generation: u64, orders: Vec<Order>) -> bool {
        if generation != self.issued || generation <= self.applied {
            debug!(
                "Discarding stale order list (fetch {} of {})",
                generation, self.issued
            );
            return false;
        }
        self.applied = generation;
        self.orders = orders;
        true
    }

    async fn fetch(&self) -> Result<Vec<Order>, ApiError> {
        match self.audience {
            Audience::Admin => self.api.list_orders(self.client_filter.as_deref()).await,
            Audience::Vendor => self.api.list_vendor_orders(&self.session.user_id).await,
        }
    }

    async fn refresh(&mut self) -> Result<(), ApiError> {
        let generation = self.begin_fetch();
        let orders = self.fetch().await?;
        self.finish_fetch(generation, orders);
        Ok(())
    }

    /// Refetch the whole collection. On failure the previous list stays.
    pub async fn reload(&mut self) -> Result<(), OrderError> {
        self.refresh().await?;
        Ok(())
    }

    /// Run `action` on order `id`, then reload.
    ///
    /// The order must be in the current list (reload first). A declined
    /// confirmation sends nothing.
    pub async fn apply(
        &mut self,
        action: OrderAction,
        id: &str,
        confirm: &dyn Confirm,
    ) -> Result<Outcome, OrderError> {
        let allowed = action.allowed_roles();
        if !self.session.role.is_some_and(|r| allowed.contains(&r)) {
            return Err(OrderError::Forbidden(format!(
                "{} requires {}",
                action.name(),
                allowed.iter().map(|r| r.as_str()).collect::<Vec<_>>().join(" or ")
            )));
        }

        let order = self
            .find(id)
            .ok_or_else(|| OrderError::NotFound(id.to_string()))?;
        let target = action.target_status(order)?;

        if action.needs_confirmation() {
            let prompt = format!("¿{} el pedido {}?", action.name(), id);
            if !confirm.confirm(&prompt) {
                info!("Order {}: {} declined", id, action.name());
                return Ok(Outcome::Declined);
            }
        }

        match action {
            OrderAction::Cancel => self.api.cancel_order(id).await?,
            OrderAction::Reactivate => self.api.reactivate_order(id).await?,
            OrderAction::Delete => self.api.delete_order(id).await?,
            OrderAction::Download | OrderAction::Capture | OrderAction::SetStatus(_) => {
                if let Some(nuevo_estado) = target {
                    let change = StatusChange {
                        nuevo_estado,
                        rol: self
                            .session
                            .role
                            .map(|r| r.as_str().to_string())
                            .unwrap_or_default(),
                    };
                    self.api.set_order_status(id, &change).await?;
                }
            }
        }
        info!("Order {}: {} applied", id, action.name());

        self.refresh().await.map_err(|e| {
            warn!("Order {} changed but the list could not be reloaded: {}", id, e);
            OrderError::Stale(e)
        })?;
        Ok(Outcome::Applied)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use joyeria_golden::NoAuth;
    use joyeria_types::{OrderStatus, Role, UserProfile};

    fn board(role: Role) -> OrderBoard {
        let api = ApiClient::new("http://127.0.0.1:9", Arc::new(NoAuth));
        let session = Session {
            token: "t".to_string(),
            user_id: "v1".to_string(),
            role: Some(role),
            profile: UserProfile {
                nombre: "Test".to_string(),
                imagen_url: None,
                rol: role.to_string(),
            },
        };
        OrderBoard::new(api, session).unwrap()
    }

    #[test]
    fn stale_fetch_never_overwrites_newer_one() {
        let mut b = board(Role::Admin);
        let older = b.begin_fetch();
        let newer = b.begin_fetch();

        assert!(b.finish_fetch(newer, vec![Order::new("new", OrderStatus::Capturado)]));
        assert!(!b.finish_fetch(older, vec![Order::new("old", OrderStatus::Solicitado)]));
        assert_eq!(b.orders()[0].id, "new");
    }

    #[test]
    fn superseded_fetch_is_dropped_even_if_it_lands_first() {
        let mut b = board(Role::Vendedor);
        let older = b.begin_fetch();
        let _newer = b.begin_fetch();
        assert!(!b.finish_fetch(older, vec![Order::new("old", OrderStatus::Solicitado)]));
        assert!(b.orders().is_empty());
    }

    #[test]
    fn counts_follow_audience_tabs() {
        let mut b = board(Role::Admin);
        let g = b.begin_fetch();
        b.finish_fetch(
            g,
            vec![
                Order::new("1", OrderStatus::Solicitado),
                Order::new("2", OrderStatus::Descargado),
                Order::new("3", OrderStatus::Capturado),
            ],
        );
        assert_eq!(
            b.counts(),
            vec![(Tab::Solicitado, 1), (Tab::Capturado, 2), (Tab::Historial, 3)]
        );
    }

    #[test]
    fn clients_have_no_board() {
        let api = ApiClient::new("http://127.0.0.1:9", Arc::new(NoAuth));
        let session = Session {
            token: "t".to_string(),
            user_id: "c1".to_string(),
            role: Some(Role::Cliente),
            profile: UserProfile {
                nombre: "C".to_string(),
                imagen_url: None,
                rol: "cliente".to_string(),
            },
        };
        assert!(matches!(OrderBoard::new(api, session), Err(OrderError::Forbidden(_))));
    }

    #[tokio::test]
    async fn vendor_cannot_delete() {
        let mut b = board(Role::Vendedor);
        let g = b.begin_fetch();
        b.finish_fetch(g, vec![Order::new("1", OrderStatus::Solicitado)]);
        let err = b
            .apply(OrderAction::Delete, "1", &joyeria_types::AssumeYes)
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::Forbidden(_)));
        assert_eq!(b.orders().len(), 1);
    }

    #[tokio::test]
    async fn vendor_cannot_cancel() {
        let mut b = board(Role::Vendedor);
        let g = b.begin_fetch();
        b.finish_fetch(g, vec![Order::new("1", OrderStatus::Descargado)]);
        for action in [OrderAction::Cancel, OrderAction::Reactivate] {
            let err = b
                .apply(action, "1", &joyeria_types::AssumeYes)
                .await
                .unwrap_err();
            assert!(matches!(err, OrderError::Forbidden(_)), "{}", err);
        }
        assert!(!b.find("1").unwrap().cancelado);
    }

    #[tokio::test]
    async fn unknown_order_is_not_found() {
        let mut b = board(Role::Admin);
        let err = b
            .apply(OrderAction::Cancel, "missing", &joyeria_types::AssumeYes)
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::NotFound(_)));
    }
}
