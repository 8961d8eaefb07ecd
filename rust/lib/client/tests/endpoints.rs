//! Wire-level checks of ApiClient against the fake backend.

use std::sync::Arc;

use joyeria_client::{ApiClient, ApiError};
use joyeria_golden::{order, user, FakeBackend, NoAuth, StaticToken};
use joyeria_types::{OrderStatus, Role, StatusChange, UserForm};

async fn setup() -> (FakeBackend, ApiClient) {
    let backend = FakeBackend::start().await;
    backend.seed_user(user("a1", "Adriana", "admin", None), "oro18k");
    backend.seed_user(user("v1", "Víctor", "vendedor", None), "plata925");
    backend.seed_user(user("c1", "Carmen", "cliente", Some("v1")), "x");
    backend.seed_order(order("p1", OrderStatus::Solicitado, "v1"));
    let token = backend.token_for("a1");
    let api = ApiClient::new(format!("{}/", backend.base_url), Arc::new(StaticToken::new(token)));
    (backend, api)
}

#[tokio::test]
async fn login_returns_token_and_user() {
    let (backend, _) = setup().await;
    let anon = ApiClient::new(&backend.base_url, Arc::new(NoAuth));

    let resp = anon.login("v1@joyeria.test", "plata925").await.unwrap();
    assert_eq!(resp.token, "tok-v1");
    assert_eq!(resp.usuario.role(), Some(Role::Vendedor));

    let err = anon.login("v1@joyeria.test", "mal").await.unwrap_err();
    match err {
        ApiError::Auth(msg) => assert!(msg.contains("Credenciales inválidas"), "{}", msg),
        other => panic!("unexpected: {}", other),
    }
}

#[tokio::test]
async fn wrapped_and_bare_lists_both_decode() {
    let (_backend, api) = setup().await;
    // `/pedidos` is wrapped, the vendor endpoint is a bare array.
    assert_eq!(api.list_orders(None).await.unwrap().len(), 1);
    let mine = api.list_vendor_orders("v1").await.unwrap();
    assert_eq!(mine[0].id, "p1");
    assert!(api.list_vendor_orders("v9").await.unwrap().is_empty());
}

#[tokio::test]
async fn status_change_body_reaches_backend() {
    let (backend, api) = setup().await;
    let change = StatusChange {
        nuevo_estado: OrderStatus::Capturado,
        rol: "admin".to_string(),
    };
    api.set_order_status("p1", &change).await.unwrap();
    assert_eq!(backend.status_changes(), vec![("p1".to_string(), change)]);
    assert_eq!(backend.orders()[0].estado, OrderStatus::Capturado);
}

#[tokio::test]
async fn server_errors_carry_status_and_message() {
    let (_backend, api) = setup().await;
    let err = api.cancel_order("nope").await.unwrap_err();
    match err {
        ApiError::Server { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Pedido no encontrado");
        }
        other => panic!("unexpected: {}", other),
    }
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let (backend, _) = setup().await;
    let anon = ApiClient::new(&backend.base_url, Arc::new(NoAuth));
    let err = anon.list_users(None).await.unwrap_err();
    assert!(err.is_unauthorized());
}

#[tokio::test]
async fn user_list_sends_role_query() {
    let (backend, api) = setup().await;
    let vendors = api.list_users(Some(Role::Vendedor)).await.unwrap();
    let ids: Vec<&str> = vendors.iter().map(|u| u.id.as_str()).collect();
    assert_eq!(ids, vec!["v1"]);
    assert_eq!(backend.queries("GET /usuarios"), vec!["rol=vendedor".to_string()]);

    assert_eq!(api.list_users(None).await.unwrap().len(), 3);
}

#[tokio::test]
async fn orders_and_users_decode_backend_field_names() {
    let (backend, api) = setup().await;
    let mut pedido = order("p2", OrderStatus::Descargado, "v1");
    pedido.numero_piezas = Some("3".into());
    pedido.nombre_pedido = Some("Boda".into());
    pedido.observaciones = Some("urgente".into());
    backend.seed_order(pedido);
    let mut ana = user("c2", "Ana", "cliente", Some("v1"));
    ana.imagen_url = Some("/up/a.png".into());
    backend.seed_user(ana, "x");

    let fetched = api.list_orders(None).await.unwrap();
    let p2 = fetched.iter().find(|o| o.id == "p2").unwrap();
    assert_eq!(p2.numero_piezas.as_deref(), Some("3"));
    assert_eq!(p2.nombre_pedido.as_deref(), Some("Boda"));
    assert_eq!(p2.observaciones.as_deref(), Some("urgente"));
    assert_eq!(api.get_user("c2").await.unwrap().imagen_url.as_deref(), Some("/up/a.png"));
}

#[tokio::test]
async fn user_endpoints_round_trip_through_multipart() {
    let (backend, api) = setup().await;

    api.create_user(&UserForm {
        nombre: Some("Rosa".into()),
        email: Some("rosa@joyeria.test".into()),
        password: Some("rubí".into()),
        rol: Some(Role::Cliente),
        vendedor_id: Some("v1".into()),
        ..Default::default()
    })
    .await
    .unwrap();

    let clients = api.list_vendor_clients("v1").await.unwrap();
    let names: Vec<&str> = clients.iter().map(|u| u.nombre.as_str()).collect();
    assert_eq!(names, vec!["Carmen", "Rosa"]);

    let rosa = clients.iter().find(|u| u.nombre == "Rosa").unwrap();
    let fetched = api.get_user(&rosa.id).await.unwrap();
    assert_eq!(fetched.email, "rosa@joyeria.test");

    api.delete_user(&rosa.id).await.unwrap();
    assert_eq!(backend.users().len(), 3);
    assert_eq!(backend.count("DELETE /usuarios/1001"), 1);
}

#[tokio::test]
async fn unreadable_attachment_fails_before_sending() {
    let (backend, api) = setup().await;
    let form = UserForm {
        nombre: Some("X".into()),
        imagen: Some("/no/such/foto.png".into()),
        ..Default::default()
    };
    let err = api.update_user("v1", &form).await.unwrap_err();
    assert!(matches!(err, ApiError::Attachment { .. }));
    assert_eq!(backend.count("PUT /usuarios/v1"), 0);
}
