// src/services/commission.rs

use std::{fmt, str::FromStr};

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use validator::{ValidationError, ValidationErrors};

use crate::common::error::AppError;

/// Casas decimais da unidade mínima da moeda (EUR).
pub const CURRENCY_SCALE: u32 = 2;

pub const DEFAULT_RATE_PERCENT: Decimal = dec!(10);

/// Maior valor que cabe em NUMERIC(12, 2).
pub const MAX_AMOUNT: Decimal = dec!(9999999999.99);

/// Erro de um valor monetário fora do que a coluna guarda: negativo, acima
/// de `MAX_AMOUNT` ou com mais de duas casas decimais.
pub fn amount_error(amount: Decimal) -> Option<ValidationError> {
    let (code, message) = if amount < Decimal::ZERO {
        ("range", "El importe no puede ser negativo")
    } else if amount > MAX_AMOUNT {
        ("range", "El importe no puede superar 9999999999.99")
    } else if amount.normalize().scale() > CURRENCY_SCALE {
        ("scale", "El importe admite como máximo 2 decimales")
    } else {
        return None;
    };
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    Some(err)
}

/// `amount_error` como erro de validação do campo `field`.
pub fn check_amount(field: &'static str, amount: Decimal) -> Result<Decimal, AppError> {
    match amount_error(amount) {
        Some(err) => {
            let mut errors = ValidationErrors::new();
            errors.add(field, err);
            Err(AppError::ValidationError(errors))
        }
        None => Ok(amount),
    }
}

/// Percentual de comissão, sempre entre 0 e 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommissionRate(Decimal);

impl CommissionRate {
    pub fn new(percent: Decimal) -> Result<Self, AppError> {
        if percent < Decimal::ZERO || percent > dec!(100) {
            return Err(AppError::validation(
                "commissionRate",
                "range",
                "La comisión debe estar entre 0 y 100",
            ));
        }
        Ok(Self(percent.normalize()))
    }

    pub fn percent(self) -> Decimal {
        self.0
    }
}

impl Default for CommissionRate {
    fn default() -> Self {
        Self(DEFAULT_RATE_PERCENT)
    }
}

impl FromStr for CommissionRate {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let percent = Decimal::from_str(s.trim()).map_err(|_| {
            AppError::validation("commissionRate", "decimal", "La comisión debe ser un número")
        })?;
        Self::new(percent)
    }
}

impl fmt::Display for CommissionRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// `sale_amount * rate_percent / 100`, arredondado em `scale` casas com meio para cima.
/// `None` se a conta estoura o `Decimal`.
pub fn commission(sale_amount: Decimal, rate_percent: Decimal, scale: u32) -> Option<Decimal> {
    sale_amount
        .checked_mul(rate_percent)?
        .checked_div(dec!(100))
        .map(|c| c.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero))
}

/// Taxa padrão do processo com override opcional por chamada.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommissionPolicy {
    pub default_rate: CommissionRate,
}

impl CommissionPolicy {
    pub fn new(default_rate: CommissionRate) -> Self {
        Self { default_rate }
    }

    pub fn effective_rate(&self, rate_override: Option<CommissionRate>) -> CommissionRate {
        rate_override.unwrap_or(self.default_rate)
    }

    /// Comissão de uma venda. O valor passa pelas mesmas regras das colunas de dinheiro.
    pub fn compute(
        &self,
        sale_amount: Decimal,
        rate_override: Option<CommissionRate>,
    ) -> Result<Decimal, AppError> {
        let amount = check_amount("importeVenta", sale_amount)?;
        commission(amount, self.effective_rate(rate_override).percent(), CURRENCY_SCALE).ok_or_else(|| {
            AppError::validation("importeVenta", "range", "El importe no puede superar 9999999999.99")
        })
    }
}
