use async_trait::async_trait;
use service_core::domain::DomainError;
use thiserror::Error;

const INT_MAX: i64 = i32::MAX as i64;
const INT_MIN: i64 = i32::MIN as i64;
const INT_MAX_WIDE: i128 = INT_MAX as i128;
const INT_MIN_WIDE: i128 = INT_MIN as i128;
const MAX_LEN: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddError {
    #[error("can't sum two zeroes")]
    TwoZeroes,
    #[error("integer overflow")]
    IntOverflow,
    #[error("result exceeds maximum size")]
    MaxSizeExceeded,
    /// An error reported by a remote instance that matches no known variant.
    #[error("{0}")]
    Remote(String),
}

impl DomainError for AddError {
    fn from_message(msg: &str) -> Option<Self> {
        [
            AddError::TwoZeroes,
            AddError::IntOverflow,
            AddError::MaxSizeExceeded,
        ]
        .into_iter()
        .find(|e| e.to_string() == msg)
    }

    fn remote(msg: String) -> Self {
        AddError::Remote(msg)
    }

    fn is_business(&self) -> bool {
        !matches!(self, AddError::Remote(_))
    }
}

#[async_trait]
pub trait AddService: Send + Sync {
    /// `a + b`, which must stay within the signed 32-bit range.
    async fn sum(&self, a: i64, b: i64) -> Result<i64, AddError>;

    /// `a` followed by `b`, at most 10 bytes in total.
    async fn concat(&self, a: &str, b: &str) -> Result<String, AddError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BasicAddService;

#[async_trait]
impl AddService for BasicAddService {
    async fn sum(&self, a: i64, b: i64) -> Result<i64, AddError> {
        if a == 0 && b == 0 {
            return Err(AddError::TwoZeroes);
        }
        // Bounds are widened so the check holds for operands that are
        // themselves outside the 32-bit range.
        let (wide_a, wide_b) = (i128::from(a), i128::from(b));
        if wide_a > INT_MAX_WIDE - wide_b || wide_a < INT_MIN_WIDE - wide_b {
            return Err(AddError::IntOverflow);
        }
        Ok(a + b)
    }

    async fn concat(&self, a: &str, b: &str) -> Result<String, AddError> {
        if a.len() + b.len() > MAX_LEN {
            return Err(AddError::MaxSizeExceeded);
        }
        Ok(format!("{a}{b}"))
    }
}
