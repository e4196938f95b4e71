//! Price calculation over raw fixed-point token amounts.
//!
//! Marketplace payloads carry prices as integer strings in the payment token's
//! native units (e.g. wei), together with the token's decimal count and a
//! token-to-USD exchange rate. All arithmetic here is exact decimal
//! arithmetic, there is no floating point between the raw amount and the
//! rendered string.

use std::fmt;

use alloy::primitives::U256;
use fastnum::{
    UD256, bint,
    decimal::{Context, RoundingMode, UnsignedDecimal},
};

/// Number of fractional digits fiat amounts are rounded to.
const FIAT_FRACTION_DIGITS: i16 = 2;

/// Price calculation failure.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PriceError {
    #[error("invalid raw token amount: {0:?}")]
    InvalidAmount(String),

    #[error("invalid exchange rate: {0:?}")]
    InvalidRate(String),

    /// Result needs more digits than the decimal type holds.
    #[error("fiat amount out of range: {0}")]
    Overflow(String),
}

fn context() -> Context {
    Context::default().with_rounding_mode(RoundingMode::HalfUp)
}

/// Fixed-point to decimal converter.
#[derive(Clone, Copy, Debug, Default)]
pub struct Converter {
    decimals: i32,
}

impl Converter {
    pub fn new(decimals: u8) -> Self {
        Self {
            decimals: decimals as i32,
        }
    }

    pub fn from_unsigned<const N: usize>(
        &self,
        value: U256,
    ) -> Result<UnsignedDecimal<N>, PriceError> {
        let unscaled = bint::UInt::<N>::from_le_slice(value.as_le_slice())
            .ok_or_else(|| PriceError::InvalidAmount(value.to_string()))?;
        Ok(UnsignedDecimal::<N>::from_parts(
            unscaled,
            -self.decimals,
            context(),
        ))
    }
}

/// Exact token amount: raw integer units scaled by the token decimals.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TokenAmount {
    raw: U256,
    decimals: u8,
}

impl TokenAmount {
    /// Parses a raw amount. Only plain ASCII decimal digits are accepted.
    pub fn parse(raw: &str, decimals: u8) -> Result<Self, PriceError> {
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PriceError::InvalidAmount(raw.to_string()));
        }
        let raw = U256::from_str_radix(raw, 10)
            .map_err(|_| PriceError::InvalidAmount(raw.to_string()))?;
        Ok(Self { raw, decimals })
    }

    pub fn raw(&self) -> U256 {
        self.raw
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn to_decimal(&self) -> Result<UD256, PriceError> {
        Converter::new(self.decimals).from_unsigned(self.raw)
    }
}

impl fmt::Display for TokenAmount {
    /// Plain decimal notation with trailing fractional zeros trimmed.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.raw.to_string();
        let scale = self.decimals as usize;
        if scale == 0 {
            return f.write_str(&digits);
        }
        let padded = format!("{digits:0>width$}", width = scale + 1);
        let (int, frac) = padded.split_at(padded.len() - scale);
        let frac = frac.trim_end_matches('0');
        if frac.is_empty() {
            f.write_str(int)
        } else {
            write!(f, "{int}.{frac}")
        }
    }
}

/// `raw / 10^decimals`.
pub fn token_amount(raw: &str, decimals: u8) -> Result<TokenAmount, PriceError> {
    TokenAmount::parse(raw, decimals)
}

/// `token_amount * exchange_rate`.
///
/// Fails with [`PriceError::Overflow`] instead of rounding away digits when
/// the exact product, or its value in cents, does not fit.
pub fn fiat_amount(amount: &TokenAmount, exchange_rate: &str) -> Result<UD256, PriceError> {
    let rate = UD256::from_str(exchange_rate.trim(), context())
        .map_err(|_| PriceError::InvalidRate(exchange_rate.to_string()))?;
    if !rate.is_finite() {
        return Err(PriceError::InvalidRate(exchange_rate.to_string()));
    }
    let fiat = amount.to_decimal()? * rate;
    if fiat.is_op_inexact() || !fiat.is_finite() {
        return Err(PriceError::Overflow(format!("{amount} * {exchange_rate}")));
    }
    to_cents(fiat)?;
    Ok(fiat)
}

/// `amount` rounded to whole cents.
fn to_cents(amount: UD256) -> Result<UD256, PriceError> {
    let cents = amount.rescale(FIAT_FRACTION_DIGITS);
    if cents.is_op_clamped()
        || !cents.is_finite()
        || cents.fractional_digits_count() != FIAT_FRACTION_DIGITS
    {
        return Err(PriceError::Overflow(format!(
            "{} cannot be expressed in cents",
            amount.digits()
        )));
    }
    Ok(cents)
}

/// Currency formatter, e.g. `$1,234.56`.
///
/// Rounds half-up to two fractional digits.
#[derive(Clone, Copy, Debug)]
pub struct FiatFormatter {
    symbol: &'static str,
    group_separator: char,
    decimal_separator: char,
}

/// Process-wide US dollar formatter.
pub const USD: FiatFormatter = FiatFormatter::usd();

impl FiatFormatter {
    pub const fn usd() -> Self {
        Self {
            symbol: "$",
            group_separator: ',',
            decimal_separator: '.',
        }
    }

    pub fn format(&self, amount: UD256) -> Result<String, PriceError> {
        let cents = to_cents(amount)?.digits().to_string();
        let fraction_digits = FIAT_FRACTION_DIGITS as usize;
        let padded = format!("{cents:0>width$}", width = fraction_digits + 1);
        let (int, frac) = padded.split_at(padded.len() - fraction_digits);

        let mut out = String::with_capacity(padded.len() + padded.len() / 3 + 2);
        out.push_str(self.symbol);
        for (i, c) in int.chars().enumerate() {
            if i > 0 && (int.len() - i) % 3 == 0 {
                out.push(self.group_separator);
            }
            out.push(c);
        }
        out.push(self.decimal_separator);
        out.push_str(frac);
        Ok(out)
    }
}

/// Formats with the shared [`USD`] formatter.
pub fn format_fiat(amount: UD256) -> Result<String, PriceError> {
    USD.format(amount)
}

/// Token price together with its fiat equivalent.
#[derive(Clone, derive_more::Debug, PartialEq)]
pub struct PriceQuote {
    token: TokenAmount,
    symbol: String,
    #[debug("{fiat}")]
    fiat: UD256,
    #[debug(skip)]
    fiat_formatted: String,
}

impl PriceQuote {
    pub fn new(
        raw: &str,
        decimals: u8,
        exchange_rate: &str,
        symbol: impl Into<String>,
    ) -> Result<Self, PriceError> {
        let token = token_amount(raw, decimals)?;
        let fiat = fiat_amount(&token, exchange_rate)?;
        Ok(Self {
            token,
            symbol: symbol.into(),
            fiat,
            fiat_formatted: format_fiat(fiat)?,
        })
    }

    pub fn token(&self) -> &TokenAmount {
        &self.token
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn fiat(&self) -> UD256 {
        self.fiat
    }

    pub fn fiat_formatted(&self) -> &str {
        &self.fiat_formatted
    }
}

impl fmt::Display for PriceQuote {
    /// `{token} {symbol} / {fiat} USD`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} / {} USD",
            self.token,
            self.symbol,
            self.fiat_formatted()
        )
    }
}
