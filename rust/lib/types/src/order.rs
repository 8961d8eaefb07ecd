use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::ParseError;

/// Workflow stage of an order.
///
/// Stages move forward `solicitado → descargado → capturado` by operator
/// action; nothing advances them automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Requested by a vendor, waiting to be picked up.
    Solicitado,
    /// Downloaded (claimed) for manufacturing.
    Descargado,
    /// Captured (fulfilled).
    Capturado,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 3] = [
        OrderStatus::Solicitado,
        OrderStatus::Descargado,
        OrderStatus::Capturado,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Solicitado => "solicitado",
            OrderStatus::Descargado => "descargado",
            OrderStatus::Capturado => "capturado",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "solicitado" => Ok(OrderStatus::Solicitado),
            "descargado" => Ok(OrderStatus::Descargado),
            "capturado" => Ok(OrderStatus::Capturado),
            _ => Err(ParseError {
                kind: "order status",
                value: s.to_string(),
            }),
        }
    }
}

/// An order ("pedido") for a jewelry piece.
///
/// Only `estado` and `cancelado` drive client logic. The descriptive
/// attributes are carried for display; the backend is loose about their
/// types, so numbers and strings are both accepted.
///
/// Order records use the backend's snake_case column names. The camelCase
/// spellings are still read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    #[serde(alias = "_id", deserialize_with = "text_or_number")]
    pub id: String,

    pub estado: OrderStatus,

    /// Orthogonal to `estado`: an order can be cancelled at any stage.
    #[serde(default)]
    pub cancelado: bool,

    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "opt_text_or_number")]
    pub modelo: Option<String>,

    /// Piece count.
    #[serde(
        default,
        alias = "numeroPiezas",
        alias = "piezas",
        skip_serializing_if = "Option::is_none",
        deserialize_with = "opt_text_or_number"
    )]
    pub numero_piezas: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "opt_text_or_number")]
    pub talla: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "opt_text_or_number")]
    pub kilataje: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "opt_text_or_number")]
    pub color: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "opt_text_or_number")]
    pub inicial: Option<String>,

    #[serde(
        default,
        alias = "nombrePedido",
        skip_serializing_if = "Option::is_none",
        deserialize_with = "opt_text_or_number"
    )]
    pub nombre_pedido: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "opt_text_or_number")]
    pub piedra: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "opt_text_or_number")]
    pub largo: Option<String>,

    /// Free-text notes.
    #[serde(
        default,
        alias = "notas",
        skip_serializing_if = "Option::is_none",
        deserialize_with = "opt_text_or_number"
    )]
    pub observaciones: Option<String>,

    #[serde(
        default,
        alias = "clienteId",
        skip_serializing_if = "Option::is_none",
        deserialize_with = "opt_text_or_number"
    )]
    pub cliente_id: Option<String>,

    #[serde(
        default,
        alias = "vendedorId",
        skip_serializing_if = "Option::is_none",
        deserialize_with = "opt_text_or_number"
    )]
    pub vendedor_id: Option<String>,

    /// Creation timestamp as sent by the backend.
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "opt_text_or_number")]
    pub fecha: Option<String>,
}

impl Order {
    /// Minimal order with only the fields the lifecycle logic reads.
    pub fn new(id: impl Into<String>, estado: OrderStatus) -> Self {
        Self {
            id: id.into(),
            estado,
            cancelado: false,
            modelo: None,
            numero_piezas: None,
            talla: None,
            kilataje: None,
            color: None,
            inicial: None,
            nombre_pedido: None,
            piedra: None,
            largo: None,
            observaciones: None,
            cliente_id: None,
            vendedor_id: None,
            fecha: None,
        }
    }
}

/// Body of `PUT /pedidos/{id}/estado`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub nuevo_estado: OrderStatus,
    pub rol: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl From<Loose> for String {
    fn from(v: Loose) -> Self {
        match v {
            Loose::Text(s) => s,
            Loose::Int(n) => n.to_string(),
            Loose::Float(n) => n.to_string(),
            Loose::Bool(b) => b.to_string(),
        }
    }
}

pub(crate) fn text_or_number<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Loose::deserialize(d).map(String::from)
}

pub(crate) fn opt_text_or_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<Loose>::deserialize(d)?.map(String::from))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("Descargado".parse::<OrderStatus>().unwrap(), OrderStatus::Descargado);
        assert_eq!(" capturado ".parse::<OrderStatus>().unwrap(), OrderStatus::Capturado);
        assert!("entregado".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn order_accepts_backend_shape() {
        let json = r#"{
            "id": "65f0a1",
            "estado": "solicitado",
            "modelo": "Anillo clásico",
            "numero_piezas": 3,
            "talla": 7.5,
            "kilataje": "14k",
            "color": "amarillo",
            "inicial": 2,
            "nombre_pedido": "Boda",
            "piedra": "zirconia",
            "largo": 45,
            "observaciones": "urgente",
            "cancelado": false,
            "vendedor_id": 12,
            "extra": {"ignored": true}
        }"#;
        let order: Order = serde_json::from_str(json).unwrap();
        assert_eq!(order.id, "65f0a1");
        assert_eq!(order.estado, OrderStatus::Solicitado);
        assert!(!order.cancelado);
        assert_eq!(order.numero_piezas.as_deref(), Some("3"));
        assert_eq!(order.talla.as_deref(), Some("7.5"));
        assert_eq!(order.inicial.as_deref(), Some("2"));
        assert_eq!(order.largo.as_deref(), Some("45"));
        assert_eq!(order.nombre_pedido.as_deref(), Some("Boda"));
        assert_eq!(order.observaciones.as_deref(), Some("urgente"));
        assert_eq!(order.vendedor_id.as_deref(), Some("12"));
    }

    #[test]
    fn order_reads_camel_case_spellings() {
        let json = r#"{
            "_id": "p9",
            "estado": "descargado",
            "piezas": 2,
            "nombrePedido": "Boda Ruiz",
            "notas": "sin grabado",
            "vendedorId": "v1"
        }"#;
        let order: Order = serde_json::from_str(json).unwrap();
        assert_eq!(order.numero_piezas.as_deref(), Some("2"));
        assert_eq!(order.nombre_pedido.as_deref(), Some("Boda Ruiz"));
        assert_eq!(order.observaciones.as_deref(), Some("sin grabado"));
        assert_eq!(order.vendedor_id.as_deref(), Some("v1"));
    }

    #[test]
    fn order_serializes_backend_names() {
        let mut order = Order::new("p1", OrderStatus::Capturado);
        order.numero_piezas = Some("3".into());
        order.nombre_pedido = Some("Boda".into());
        order.observaciones = Some("urgente".into());
        let value = serde_json::to_value(&order).unwrap();
        assert_eq!(value["numero_piezas"], "3");
        assert_eq!(value["nombre_pedido"], "Boda");
        assert_eq!(value["observaciones"], "urgente");
        assert!(value.get("vendedor_id").is_none());
    }

    #[test]
    fn numeric_id_becomes_text() {
        let order: Order = serde_json::from_str(r#"{"id": 42, "estado": "capturado", "cancelado": true}"#).unwrap();
        assert_eq!(order.id, "42");
        assert!(order.cancelado);
    }

    #[test]
    fn status_change_uses_backend_field_names() {
        let body = StatusChange {
            nuevo_estado: OrderStatus::Descargado,
            rol: "vendedor".into(),
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["nuevoEstado"], "descargado");
        assert_eq!(value["rol"], "vendedor");
    }
}
