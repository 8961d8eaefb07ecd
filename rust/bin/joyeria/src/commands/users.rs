//! User and client management commands.
//!
//! `users ...` is the admin screen over every account; `clients ...` is the
//! vendor screen over the vendor's own clients. Both go through the same
//! [`UserDirectory`], scoped by the session role.

use std::path::PathBuf;

use anyhow::Result;
use joyeria_auth::View;
use joyeria_types::{AssumeYes, Confirm, Outcome, Role, User, UserForm};
use joyeria_users::UserDirectory;

use super::{cell, print_table, App, StdinConfirm};

/// Form fields shared by create and update.
#[derive(clap::Args, Debug, Default)]
pub struct UserFields {
    #[arg(long)]
    pub nombre: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    /// Password (left unchanged on update when omitted).
    #[arg(long)]
    pub password: Option<String>,
    /// admin, vendedor or cliente. Ignored for clients.
    #[arg(long)]
    pub rol: Option<Role>,
    /// Owning vendor for a client. Ignored for clients.
    #[arg(long = "vendedor")]
    pub vendedor_id: Option<String>,
    #[arg(long)]
    pub telefono: Option<String>,
    /// Profile image file to upload.
    #[arg(long)]
    pub imagen: Option<PathBuf>,
}

impl UserFields {
    fn into_form(self) -> UserForm {
        UserForm {
            nombre: self.nombre,
            email: self.email,
            password: self.password,
            rol: self.rol,
            vendedor_id: self.vendedor_id,
            telefono: self.telefono,
            imagen: self.imagen,
        }
    }
}

async fn open(app: &App, view: View) -> Result<UserDirectory> {
    open_filtered(app, view, None).await
}

async fn open_filtered(app: &App, view: View, role: Option<Role>) -> Result<UserDirectory> {
    let session = app.enter(view)?;
    let mut dir = UserDirectory::new(app.api.clone(), &session)?.with_role_filter(role);
    dir.reload().await?;
    Ok(dir)
}

pub async fn list(app: &App, view: View, role: Option<Role>) -> Result<()> {
    let dir = open_filtered(app, view, role).await?;
    // The backend may ignore `rol`; filter again locally.
    let users: Vec<&User> = match role {
        Some(r) => dir.with_role(r),
        None => dir.users().iter().collect(),
    };
    print_users(app, &users)
}

/// An admin's view of one vendor's clients.
pub async fn clients_of(app: &App, vendor_id: &str) -> Result<()> {
    let session = app.enter(View::AdminUsers)?;
    let dir = UserDirectory::new(app.api.clone(), &session)?;
    let clients = dir.clients_of(vendor_id).await?;
    let users: Vec<&User> = clients.iter().collect();
    print_users(app, &users)
}

fn print_users(app: &App, users: &[&User]) -> Result<()> {
    if app.json {
        return app.print_json(users);
    }
    if users.is_empty() {
        println!("No users.");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = users
        .iter()
        .map(|u| {
            vec![
                u.id.clone(),
                u.nombre.clone(),
                u.email.clone(),
                u.rol.clone(),
                cell(&u.vendedor_id),
                cell(&u.telefono),
                cell(&u.imagen_url),
            ]
        })
        .collect();
    print_table(&["ID", "NOMBRE", "EMAIL", "ROL", "VENDEDOR", "TELEFONO", "IMAGEN"], &rows);
    Ok(())
}

pub async fn get(app: &App, view: View, id: &str) -> Result<()> {
    let mut dir = open(app, view).await?;
    let user = dir.get(id).await?;
    if app.json {
        return app.print_json(&user);
    }
    println!("ID:       {}", user.id);
    println!("Nombre:   {}", user.nombre);
    println!("Email:    {}", user.email);
    println!("Rol:      {}", user.rol);
    println!("Vendedor: {}", cell(&user.vendedor_id));
    println!("Teléfono: {}", cell(&user.telefono));
    println!("Imagen:   {}", cell(&user.imagen_url));
    Ok(())
}

pub async fn create(app: &App, view: View, fields: UserFields) -> Result<()> {
    let form = fields.into_form();
    if form.nombre.is_none() || form.email.is_none() {
        anyhow::bail!("--nombre and --email are required.");
    }
    let mut dir = open(app, view).await?;
    dir.create(form).await?;
    println!("User created. {} accounts listed.", dir.users().len());
    Ok(())
}

pub async fn update(app: &App, view: View, id: &str, fields: UserFields) -> Result<()> {
    let form = fields.into_form();
    if form == UserForm::default() {
        anyhow::bail!("Nothing to update.");
    }
    let mut dir = open(app, view).await?;
    dir.update(id, form).await?;
    println!("User {} updated.", id);
    Ok(())
}

pub async fn delete(app: &App, view: View, id: &str, yes: bool) -> Result<()> {
    let mut dir = open(app, view).await?;
    let confirm: &dyn Confirm = if yes { &AssumeYes } else { &StdinConfirm };
    match dir.delete(id, confirm).await? {
        Outcome::Declined => println!("Cancelled."),
        Outcome::Applied => println!("User {} deleted.", id),
    }
    Ok(())
}
