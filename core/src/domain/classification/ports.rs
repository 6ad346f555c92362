use std::future::Future;

use crate::domain::{
    classification::entities::ClassificationResult,
    common::entities::app_errors::ClassificationError, image::entities::Bitmap,
};

/// Image classifier used to name the pictured dish.
///
/// Implementations are created once and shared by concurrent pipeline
/// executions, so `classify` must not need exclusive access.
#[cfg_attr(test, mockall::automock)]
pub trait FoodClassifier: Send + Sync {
    fn classify(
        &self,
        bitmap: &Bitmap,
    ) -> impl Future<Output = Result<ClassificationResult, ClassificationError>> + Send;
}
