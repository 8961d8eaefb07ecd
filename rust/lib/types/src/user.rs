use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::order::{opt_text_or_number, text_or_number};
use crate::ParseError;

/// Account role as the backend spells it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Vendedor,
    Cliente,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Vendedor => "vendedor",
            Role::Cliente => "cliente",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "vendedor" => Ok(Role::Vendedor),
            "cliente" => Ok(Role::Cliente),
            _ => Err(ParseError {
                kind: "role",
                value: s.to_string(),
            }),
        }
    }
}

/// A user account ("usuario").
///
/// `rol` stays a raw string so that a record with a role this client does
/// not know still deserializes; use [`User::role`] for the typed view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(alias = "_id", deserialize_with = "text_or_number")]
    pub id: String,

    pub nombre: String,

    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub rol: String,

    #[serde(
        default,
        rename = "imagen_url",
        alias = "imagenUrl",
        skip_serializing_if = "Option::is_none"
    )]
    pub imagen_url: Option<String>,

    /// Owning vendor, set on `cliente` records.
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "opt_text_or_number")]
    pub vendedor_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telefono: Option<String>,
}

impl User {
    pub fn role(&self) -> Option<Role> {
        self.rol.parse().ok()
    }

    /// Display attributes cached in the session at login.
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            nombre: self.nombre.clone(),
            imagen_url: self.imagen_url.clone(),
            rol: self.rol.clone(),
        }
    }
}

/// Denormalized user attributes kept in the session for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub nombre: String,
    #[serde(
        default,
        rename = "imagen_url",
        alias = "imagenUrl",
        skip_serializing_if = "Option::is_none"
    )]
    pub imagen_url: Option<String>,
    pub rol: String,
}

/// Body of `POST /usuarios/login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response of `POST /usuarios/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub usuario: User,
}

/// Create/update payload for a user, sent as a multipart form.
///
/// On update, `None` fields are left out of the form and keep their stored
/// value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserForm {
    pub nombre: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub rol: Option<Role>,
    pub vendedor_id: Option<String>,
    pub telefono: Option<String>,
    /// Local image file attached as the `imagen` part.
    pub imagen: Option<PathBuf>,
}

impl UserForm {
    /// Text fields in form order, skipping unset ones.
    pub fn text_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = Vec::new();
        if let Some(v) = &self.nombre {
            fields.push(("nombre", v.clone()));
        }
        if let Some(v) = &self.email {
            fields.push(("email", v.clone()));
        }
        if let Some(v) = &self.password {
            fields.push(("password", v.clone()));
        }
        if let Some(v) = &self.rol {
            fields.push(("rol", v.as_str().to_string()));
        }
        if let Some(v) = &self.vendedor_id {
            fields.push(("vendedorId", v.clone()));
        }
        if let Some(v) = &self.telefono {
            fields.push(("telefono", v.clone()));
        }
        fields
    }
}
