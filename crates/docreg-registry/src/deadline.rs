use std::future::Future;
use std::time::Duration;

use crate::error::{RegistryError, RegistryResult};

/// Run `fut` under `limit`, tagging an expiry with the step name.
pub(crate) async fn within<T, E>(
    step: &'static str,
    limit: Duration,
    fut: impl Future<Output = Result<T, E>>,
) -> RegistryResult<T>
where
    RegistryError: From<E>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result.map_err(RegistryError::from),
        Err(_) => Err(RegistryError::Timeout { step, limit }),
    }
}
