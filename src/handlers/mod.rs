use actix_web::web;
use chrono::{NaiveDate, Utc};

use crate::error::AppError;

pub mod brands;
pub mod categories;
pub mod panel;
pub mod products;
pub mod uploads;

/// Runs store work on actix's blocking thread pool.
pub async fn blocking<F, T>(work: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    web::block(work).await?
}

pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}
