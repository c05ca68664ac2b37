use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "employee_code": "EMP-001",
        "full_name": "John Doe",
        "email": "john.doe@company.com",
        "phone": "+8801712345678",
        "department": "Engineering",
        "position": "Backend Developer",
        "joining_date": "2024-01-01"
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: i64,

    #[schema(example = "EMP-001")]
    pub employee_code: String,

    #[schema(example = "John Doe")]
    pub full_name: String,

    #[schema(example = "john.doe@company.com")]
    pub email: String,

    #[schema(example = "+8801712345678", nullable = true)]
    pub phone: Option<String>,

    #[schema(example = "Engineering")]
    pub department: String,

    #[schema(example = "Backend Developer")]
    pub position: String,

    /// Raw text as submitted by the directory form. Anything that needs an
    /// actual date parses it leniently; see `engine::roster`.
    #[schema(example = "2024-01-01", nullable = true)]
    pub joining_date: Option<String>,
}
