//! Canned API documents shaped like the server's serializers.

use serde_json::{Value, json};

/// Profile document for `GET /auth/profile/`.
#[must_use]
pub fn profile_json(id: i64, username: &str, tipo: &str, debe_cambiar_password: bool) -> Value {
    json!({
        "id": id,
        "username": username,
        "email": format!("{username}@example.org"),
        "first_name": "Ana",
        "last_name": "Pérez",
        "tipo": tipo,
        "telefono": null,
        "fecha_nacimiento": null,
        "direccion": null,
        "activo": true,
        "debe_cambiar_password": debe_cambiar_password,
        "fecha_creacion": "2024-02-01T12:00:00Z"
    })
}

/// Token pair returned by the login endpoint.
#[must_use]
pub fn token_pair_json(access: &str, refresh: &str) -> Value {
    json!({"access": access, "refresh": refresh})
}

/// Course document.
#[must_use]
pub fn curso_json(id: i64, nombre: &str) -> Value {
    json!({
        "id": id,
        "nombre": nombre,
        "descripcion": null,
        "activo": true,
        "fecha_creacion": "2024-01-15T09:30:00Z",
        "fecha_actualizacion": "2024-01-15T09:30:00Z"
    })
}

/// Material document without a server-provided file name.
#[must_use]
pub fn material_json(id: i64, tema: i64, titulo: &str) -> Value {
    json!({
        "id": id,
        "tema": tema,
        "titulo": titulo,
        "descripcion": null,
        "archivo": format!("/media/materiales/{id}.bin"),
        "fecha_creacion": "2024-03-01T10:00:00Z"
    })
}
