#![allow(dead_code)]

use chrono::NaiveDate;
use sqlsynth_derive::Entity;

#[derive(Debug, Clone, Entity)]
pub struct Staff {
    #[column(primary_key)]
    pub staff_id: String,
    pub staff_name: Option<String>,
    pub position: Option<String>,
}

impl Staff {
    pub fn new(id: &str, name: Option<&str>, position: Option<&str>) -> Self {
        Self {
            staff_id: id.to_owned(),
            staff_name: name.map(str::to_owned),
            position: position.map(str::to_owned),
        }
    }
}

#[derive(Debug, Clone, Entity)]
pub struct Audit {
    pub created_by: Option<String>,
    pub created_on: Option<NaiveDate>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Entity)]
#[entity(table = "order_lines")]
pub struct OrderLine {
    #[column(primary_key)]
    pub order_id: i64,
    #[column(primary_key, name = "line_no")]
    pub line: i32,
    pub quantity: Option<i32>,
    #[column(flatten)]
    pub audit: Audit,
    #[column(name = "remark")]
    pub note: Option<String>,
    #[column(skip)]
    pub dirty: bool,
}

#[derive(Debug, Clone, Entity)]
pub struct EventLog {
    pub message: String,
}
