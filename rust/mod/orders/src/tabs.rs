use std::fmt;
use std::str::FromStr;

use joyeria_types::{Order, OrderStatus, ParseError, Role};

/// Which dashboard is looking at the orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    Admin,
    Vendor,
}

impl Audience {
    pub fn for_role(role: Role) -> Option<Audience> {
        match role {
            Role::Admin => Some(Audience::Admin),
            Role::Vendedor => Some(Audience::Vendor),
            Role::Cliente => None,
        }
    }

    /// Tabs shown on this dashboard, default first.
    pub fn tabs(&self) -> &'static [Tab] {
        match self {
            Audience::Admin => &[Tab::Solicitado, Tab::Capturado, Tab::Historial],
            Audience::Vendor => &[Tab::Solicitado, Tab::Descargado, Tab::Capturado, Tab::Historial],
        }
    }

    pub fn default_tab(&self) -> Tab {
        Tab::Solicitado
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tab {
    Solicitado,
    Descargado,
    Capturado,
    /// Everything, no filter.
    Historial,
}

impl Tab {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tab::Solicitado => "solicitado",
            Tab::Descargado => "descargado",
            Tab::Capturado => "capturado",
            Tab::Historial => "historial",
        }
    }

    /// Whether `order` belongs under this tab for `audience`.
    ///
    /// The admin "capturado" tab also holds `descargado` orders; the vendor
    /// tabs compare `estado` exactly.
    pub fn matches(&self, audience: Audience, order: &Order) -> bool {
        match (self, audience) {
            (Tab::Historial, _) => true,
            (Tab::Solicitado, _) => order.estado == OrderStatus::Solicitado,
            (Tab::Descargado, _) => order.estado == OrderStatus::Descargado,
            (Tab::Capturado, Audience::Admin) => matches!(
                order.estado,
                OrderStatus::Capturado | OrderStatus::Descargado
            ),
            (Tab::Capturado, Audience::Vendor) => order.estado == OrderStatus::Capturado,
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tab {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "solicitado" | "solicitados" => Ok(Tab::Solicitado),
            "descargado" | "descargados" => Ok(Tab::Descargado),
            "capturado" | "capturados" => Ok(Tab::Capturado),
            "historial" => Ok(Tab::Historial),
            _ => Err(ParseError {
                kind: "tab",
                value: s.to_string(),
            }),
        }
    }
}

/// Orders under `tab`, in list order.
pub fn filter<'a, I>(audience: Audience, tab: Tab, orders: I) -> Vec<&'a Order>
where
    I: IntoIterator<Item = &'a Order>,
{
    orders
        .into_iter()
        .filter(|o| tab.matches(audience, o))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Order> {
        let mut cancelled = Order::new("5", OrderStatus::Solicitado);
        cancelled.cancelado = true;
        vec![
            Order::new("1", OrderStatus::Solicitado),
            Order::new("2", OrderStatus::Descargado),
            Order::new("3", OrderStatus::Capturado),
            Order::new("4", OrderStatus::Descargado),
            cancelled,
        ]
    }

    fn ids(orders: &[&Order]) -> Vec<String> {
        orders.iter().map(|o| o.id.clone()).collect()
    }

    #[test]
    fn admin_capturado_tab_groups_descargado() {
        let orders = sample();
        let tab = filter(Audience::Admin, Tab::Capturado, &orders);
        assert_eq!(ids(&tab), vec!["2", "3", "4"]);
    }

    #[test]
    fn vendor_tabs_use_exact_status() {
        let orders = sample();
        assert_eq!(ids(&filter(Audience::Vendor, Tab::Descargado, &orders)), vec!["2", "4"]);
        assert_eq!(ids(&filter(Audience::Vendor, Tab::Capturado, &orders)), vec!["3"]);
        assert_eq!(ids(&filter(Audience::Vendor, Tab::Solicitado, &orders)), vec!["1", "5"]);
    }

    #[test]
    fn historial_keeps_everything() {
        let orders = sample();
        for audience in [Audience::Admin, Audience::Vendor] {
            assert_eq!(filter(audience, Tab::Historial, &orders).len(), orders.len());
        }
    }

    #[test]
    fn filtering_is_idempotent() {
        let orders = sample();
        for audience in [Audience::Admin, Audience::Vendor] {
            for &tab in audience.tabs() {
                let once = filter(audience, tab, &orders);
                let twice = filter(audience, tab, once.iter().copied());
                assert_eq!(once, twice, "{:?}/{}", audience, tab);
            }
        }
    }

    #[test]
    fn cancelled_orders_stay_in_their_status_tab() {
        let orders = sample();
        let tab = filter(Audience::Admin, Tab::Solicitado, &orders);
        assert!(tab.iter().any(|o| o.id == "5" && o.cancelado));
    }

    #[test]
    fn admin_has_no_descargado_tab() {
        assert!(!Audience::Admin.tabs().contains(&Tab::Descargado));
        assert_eq!(Audience::Admin.default_tab(), Tab::Solicitado);
        assert_eq!(Audience::Vendor.tabs().len(), 4);
    }

    #[test]
    fn tab_parses_plural_labels() {
        assert_eq!("Capturados".parse::<Tab>().unwrap(), Tab::Capturado);
        assert!("pendiente".parse::<Tab>().is_err());
    }
}
