//! Order dashboard commands.

use anyhow::Result;
use joyeria_auth::View;
use joyeria_orders::{OrderAction, OrderBoard, Tab};
use joyeria_types::{AssumeYes, Confirm, Order, Outcome};

use super::{cell, print_table, App, StdinConfirm};

/// Fetch the role's orders and print one tab with the tab badges.
pub async fn list(app: &App, tab: Option<Tab>, client: Option<String>) -> Result<()> {
    let session = app.enter(app.dashboard())?;
    let mut board = OrderBoard::new(app.api.clone(), session)?.with_client(client);
    board.reload().await?;

    let audience = board.audience();
    let tab = tab.unwrap_or_else(|| audience.default_tab());
    if !audience.tabs().contains(&tab) {
        let names: Vec<&str> = audience.tabs().iter().map(Tab::as_str).collect();
        anyhow::bail!("No \"{}\" tab on this dashboard. Tabs: {}.", tab, names.join(", "));
    }
    let orders = board.tab(tab);

    if app.json {
        return app.print_json(&orders);
    }

    let badges: Vec<String> = board
        .counts()
        .into_iter()
        .map(|(t, n)| {
            let marker = if t == tab { "*" } else { "" };
            format!("{}{} ({})", marker, t, n)
        })
        .collect();
    println!("{}", badges.join("  "));
    println!();

    if orders.is_empty() {
        println!("No orders.");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = orders.iter().map(|o| row(o)).collect();
    print_table(&COLUMNS, &rows);
    Ok(())
}

const COLUMNS: [&str; 13] = [
    "ID",
    "ESTADO",
    "CANCELADO",
    "MODELO",
    "PIEZAS",
    "TALLA",
    "KILATAJE",
    "COLOR",
    "INICIAL",
    "NOMBRE",
    "PIEDRA",
    "LARGO",
    "OBSERVACIONES",
];

/// One table row, in [`COLUMNS`] order.
fn row(o: &Order) -> Vec<String> {
    vec![
        o.id.clone(),
        o.estado.to_string(),
        if o.cancelado { "sí" } else { "no" }.to_string(),
        cell(&o.modelo),
        cell(&o.numero_piezas),
        cell(&o.talla),
        cell(&o.kilataje),
        cell(&o.color),
        cell(&o.inicial),
        cell(&o.nombre_pedido),
        cell(&o.piedra),
        cell(&o.largo),
        cell(&o.observaciones),
    ]
}

/// Run one action against an order and show its state after the reload.
pub async fn apply(app: &App, action: OrderAction, id: &str, yes: bool) -> Result<()> {
    let view = match action {
        OrderAction::Download | OrderAction::Capture => app.dashboard(),
        _ => View::AdminDashboard,
    };
    let session = app.enter(view)?;
    let mut board = OrderBoard::new(app.api.clone(), session)?;
    board.reload().await?;

    let confirm: &dyn Confirm = if yes { &AssumeYes } else { &StdinConfirm };
    match board.apply(action, id, confirm).await? {
        Outcome::Declined => println!("Cancelled."),
        Outcome::Applied => match board.find(id) {
            Some(o) if app.json => app.print_json(o)?,
            Some(o) => println!(
                "Order {}: {}, estado {}{}.",
                id,
                action.name(),
                o.estado,
                if o.cancelado { " (cancelado)" } else { "" }
            ),
            None => println!("Order {} deleted.", id),
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use joyeria_types::OrderStatus;

    #[test]
    fn row_shows_order_card_fields() {
        let order: Order = serde_json::from_str(
            r#"{"id":"p1","estado":"descargado","numero_piezas":3,"nombre_pedido":"Boda",
                "observaciones":"urgente","color":"rosa","largo":45}"#,
        )
        .unwrap();
        let row = row(&order);
        assert_eq!(row.len(), COLUMNS.len());
        let at = |name: &str| row[COLUMNS.iter().position(|c| *c == name).unwrap()].as_str();
        assert_eq!(at("ESTADO"), OrderStatus::Descargado.as_str());
        assert_eq!(at("PIEZAS"), "3");
        assert_eq!(at("NOMBRE"), "Boda");
        assert_eq!(at("OBSERVACIONES"), "urgente");
        assert_eq!(at("LARGO"), "45");
        assert_eq!(at("PIEDRA"), "-");
    }
}
