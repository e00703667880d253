//! Final averages and diplomas.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Computed final average of an enrollment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Promedio {
    /// Identifier.
    pub id: i64,
    /// Enrollment averaged.
    pub inscripcion: i64,
    /// Denormalised student name.
    #[serde(default)]
    pub alumno_nombre: Option<String>,
    /// Denormalised promotion name.
    #[serde(default)]
    pub promocion_nombre: Option<String>,
    /// Denormalised course name.
    #[serde(default)]
    pub curso_nombre: Option<String>,
    /// Final average on a 0-100 scale.
    #[serde(deserialize_with = "crate::decimal::f64_lenient")]
    pub promedio_final: f64,
    /// Whether the average passes.
    #[serde(default)]
    pub aprobado: bool,
    /// Calculation timestamp.
    #[serde(default)]
    pub fecha_calculo: Option<DateTime<Utc>>,
}

/// Diploma awarded to an enrollment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Diploma {
    /// Identifier.
    pub id: i64,
    /// Enrollment awarded.
    pub inscripcion: i64,
    /// Denormalised student name.
    #[serde(default)]
    pub alumno_nombre: Option<String>,
    /// Denormalised promotion name.
    #[serde(default)]
    pub promocion_nombre: Option<String>,
    /// Denormalised course name.
    #[serde(default)]
    pub curso_nombre: Option<String>,
    /// Verification code.
    pub codigo_diploma: String,
    /// Issue timestamp.
    #[serde(default)]
    pub fecha_emision: Option<DateTime<Utc>>,
    /// Expiry date.
    #[serde(default)]
    pub fecha_validez: Option<NaiveDate>,
    /// Whether the diploma is valid.
    #[serde(default = "default_true")]
    pub activo: bool,
}

/// Body of the promotion-wide actions (`calcular_promedios`, `generar_diplomas`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PromocionRequest {
    /// Promotion the action applies to.
    pub promocion_id: i64,
}

/// One diploma issued by `generar_diplomas`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiplomaEmitido {
    /// Student display name.
    pub alumno: String,
    /// Verification code.
    pub codigo: String,
}

/// Response of `POST /diplomas/generar_diplomas/`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiplomasGenerados {
    /// Summary message.
    pub mensaje: String,
    /// Newly issued diplomas; existing ones are not repeated.
    #[serde(default)]
    pub diplomas: Vec<DiplomaEmitido>,
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn promedio_decodes_decimal_string() -> Result<(), serde_json::Error> {
        let promedio: Promedio = serde_json::from_value(json!({
            "id": 1,
            "inscripcion": 7,
            "alumno_nombre": "Ana Ruiz",
            "promedio_final": "72.50",
            "aprobado": true,
            "fecha_calculo": "2024-06-01T12:00:00Z"
        }))?;
        assert!((promedio.promedio_final - 72.5).abs() < f64::EPSILON);
        Ok(())
    }

    #[test]
    fn generated_diplomas_decode() -> Result<(), serde_json::Error> {
        let generated: DiplomasGenerados = serde_json::from_value(json!({
            "mensaje": "Diplomas generados: 1",
            "diplomas": [{"alumno": "Ana Ruiz", "codigo": "DIP-0001"}]
        }))?;
        assert_eq!(generated.diplomas.len(), 1);
        assert_eq!(generated.diplomas[0].codigo, "DIP-0001");
        Ok(())
    }
}
