//! Integration tests for error types

#[cfg(test)]
mod tests {
    use kiln_errors::*;

    #[test]
    fn test_error_conversion() {
        let net_err = NetworkError::Timeout {
            url: "https://example.com".into(),
        };
        let err: Error = net_err.into();
        assert!(matches!(err, Error::Network(_)));
    }

    #[test]
    fn test_error_display() {
        let err = BuildError::StepTimeout {
            step_index: 2,
            seconds: 30,
        };
        assert_eq!(err.to_string(), "build step 2 timed out after 30 seconds");
    }

    #[test]
    fn test_error_clone() {
        let err = RecipeError::MissingField {
            field: "source.fetch.url".into(),
        };
        let cloned = err.clone();
        assert_eq!(err.to_string(), cloned.to_string());
    }

    #[test]
    fn test_retryability() {
        let fetch: Error = NetworkError::DownloadFailed("reset".into()).into();
        assert!(fetch.is_retryable());

        let integrity: Error = BuildError::HashMismatch {
            file: "libmad-0.16.4.tar.gz".into(),
            expected: "aa".into(),
            actual: "bb".into(),
        }
        .into();
        assert!(!integrity.is_retryable());

        let step: Error = BuildError::StepFailed {
            step_index: 0,
            exit_code: Some(1),
            stdout: String::new(),
            stderr: String::new(),
        }
        .into();
        assert!(!step.is_retryable());
    }

    #[test]
    fn test_step_failure_context_preserved() {
        let err = BuildError::StepFailed {
            step_index: 3,
            exit_code: Some(2),
            stdout: "checking for gcc... no".into(),
            stderr: "configure: error: no acceptable C compiler".into(),
        };
        if let BuildError::StepFailed {
            step_index,
            exit_code,
            stderr,
            ..
        } = &err
        {
            assert_eq!(*step_index, 3);
            assert_eq!(*exit_code, Some(2));
            assert!(stderr.contains("no acceptable C compiler"));
        } else {
            unreachable!();
        }
    }
}
