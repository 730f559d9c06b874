/*!
 * Tests for error types and their conversions
 */

use locsync::errors::{AppError, FieldFailure, ProviderError, StoreError, SyncError, TranslationError};

#[test]
fn test_providerError_withApiError_shouldFormatStatus() {
    let error = ProviderError::ApiError {
        status_code: 503,
        message: "unavailable".to_string(),
    };
    assert_eq!(error.to_string(), "API responded with error: 503 - unavailable");
}

#[test]
fn test_providerError_retryability_shouldFollowKind() {
    assert!(ProviderError::ConnectionError("reset".to_string()).is_retryable());
    assert!(ProviderError::RateLimitExceeded {
        message: "slow down".to_string(),
        retry_after_secs: Some(2),
    }
    .is_retryable());
    assert!(ProviderError::ApiError {
        status_code: 502,
        message: String::new(),
    }
    .is_retryable());
    assert!(!ProviderError::ApiError {
        status_code: 400,
        message: String::new(),
    }
    .is_retryable());
    assert!(!ProviderError::AuthenticationError("bad key".to_string()).is_retryable());
    assert!(!ProviderError::NotFound("page".to_string()).is_retryable());
}

#[test]
fn test_structuralError_withSeveralFailures_shouldListEveryNode() {
    let error = StoreError::Structural {
        target: "page home".to_string(),
        failures: vec![
            FieldFailure {
                node_id: "t1".to_string(),
                error: "Expected p".to_string(),
            },
            FieldFailure {
                node_id: "i1/title".to_string(),
                error: "Invalid value".to_string(),
            },
        ],
    };
    assert_eq!(
        error.to_string(),
        "Structural validation failed for page home: t1 (Expected p), i1/title (Invalid value)"
    );
}

#[test]
fn test_syncError_fromStoreError_shouldKeepMessage() {
    let error: SyncError = StoreError::NotFound("component card".to_string()).into();
    assert_eq!(error.to_string(), "Content not found: component card");

    let error: SyncError = TranslationError::AllBatchesFailed(4).into();
    assert_eq!(error.to_string(), "All 4 translation units failed to translate");

    assert!(SyncError::NotATarget("de".to_string()).to_string().contains("not a translation target"));
}

#[test]
fn test_appError_conversions_shouldWrapSource() {
    let error: AppError = ProviderError::AuthenticationError("expired".to_string()).into();
    assert!(matches!(error, AppError::Provider(_)));
    assert_eq!(error.to_string(), "Provider error: Authentication error: expired");

    let error: AppError = StoreError::from(ProviderError::RequestFailed("boom".to_string())).into();
    assert!(matches!(error, AppError::Store(StoreError::Http(_))));

    let error: AppError = std::io::Error::new(std::io::ErrorKind::NotFound, "missing").into();
    assert!(matches!(error, AppError::File(_)));

    let error: AppError = anyhow::anyhow!("odd").into();
    assert_eq!(error.to_string(), "Unknown error: odd");
}
