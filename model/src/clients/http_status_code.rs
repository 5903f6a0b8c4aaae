pub use http::StatusCode;
use kube::Error;

pub trait HttpStatusCode {
    fn status_code(&self) -> Option<StatusCode>;

    fn is_status_code(&self, status_code: StatusCode) -> bool {
        self.status_code()
            .map(|some| some == status_code)
            .unwrap_or_default()
    }

    fn is_not_found(&self) -> bool {
        self.is_status_code(StatusCode::NOT_FOUND)
    }
}

impl HttpStatusCode for kube::Error {
    fn status_code(&self) -> Option<StatusCode> {
        if let Error::Api(error_response) = self {
            StatusCode::from_u16(error_response.code).ok()
        } else {
            None
        }
    }
}

impl<T, E> HttpStatusCode for std::result::Result<T, E>
where
    E: HttpStatusCode,
{
    fn status_code(&self) -> Option<StatusCode> {
        self.as_ref().err().and_then(|e| e.status_code())
    }
}

/// Turns a not found error into `Ok(None)`.
pub trait AllowNotFound<T, E> {
    /// `f` is called with the not found error before it is discarded.
    fn allow_not_found<F>(self, f: F) -> std::result::Result<Option<T>, E>
    where
        F: FnOnce(E);
}

impl<T, E> AllowNotFound<T, E> for std::result::Result<T, E>
where
    E: HttpStatusCode,
{
    fn allow_not_found<F>(self, f: F) -> std::result::Result<Option<T>, E>
    where
        F: FnOnce(E),
    {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_not_found() => {
                f(e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use kube::error::ErrorResponse;

    fn api_error(code: u16) -> kube::Error {
        kube::Error::Api(ErrorResponse {
            status: "Failure".to_string(),
            message: "managedclusters.cluster.open-cluster-management.io \"x\" not found"
                .to_string(),
            reason: "NotFound".to_string(),
            code,
        })
    }

    #[test]
    fn status_codes() {
        assert!(api_error(404).is_not_found());
        assert!(!api_error(409).is_not_found());
        assert_eq!(api_error(409).status_code(), Some(StatusCode::CONFLICT));
        let result: std::result::Result<(), kube::Error> = Err(api_error(404));
        assert!(result.is_not_found());
        let ok: std::result::Result<(), kube::Error> = Ok(());
        assert!(ok.status_code().is_none());
    }

    #[test]
    fn allow_not_found() {
        let result: std::result::Result<u8, kube::Error> = Err(api_error(404));
        assert_eq!(result.allow_not_found(|_| ()).unwrap(), None);
        let result: std::result::Result<u8, kube::Error> = Ok(7);
        assert_eq!(result.allow_not_found(|_| ()).unwrap(), Some(7));
        let result: std::result::Result<u8, kube::Error> = Err(api_error(500));
        assert!(result.allow_not_found(|_| ()).is_err());
    }
}
