//! Currency commands.

use anyhow::Result;
use serde_json::json;
use turbo_commerce::currency::RateStatus;
use turbo_commerce::{CommerceState, Currency, Money};

use super::{CurrencyArgs, CurrencyCommand};
use crate::context::Context;

/// Run the currency command.
pub async fn run(args: CurrencyArgs, ctx: &Context) -> Result<()> {
    let mut state = ctx.open_state().await?;

    match args.command {
        CurrencyCommand::Set { code } => {
            state.set_currency_code(&code.to_uppercase())?;
            show_currency(&state, ctx);
        }
        CurrencyCommand::Show => show_currency(&state, ctx),
        CurrencyCommand::Format { amount } => {
            let formatted = state.format_price(Some(Money::from_major(amount, Currency::BASE)));
            if ctx.output.is_json() {
                ctx.output.json(&json!({
                    "amount": amount,
                    "currency": state.selected_currency().code(),
                    "formatted": formatted,
                }));
            } else {
                println!("{formatted}");
            }
        }
    }

    Ok(())
}

fn show_currency(state: &CommerceState, ctx: &Context) {
    let selected = state.selected_currency();
    let status = state.currency().rate_status();
    let rate = status.rate();
    let source = match status {
        RateStatus::Live(_) => "live",
        RateStatus::Fallback(_) => "fallback",
    };

    if ctx.output.is_json() {
        ctx.output.json(&json!({
            "currency": selected.code(),
            "locale": selected.locale(),
            "rate": rate,
            "rate_source": source,
        }));
        return;
    }

    if !status.is_live() {
        ctx.output
            .warn("Could not fetch a live exchange rate; prices use the fallback rate");
    }
    ctx.output.header("Currency");
    ctx.output.kv("selected", &format!("{} ({})", selected.code(), selected.symbol()));
    ctx.output.kv("locale", selected.locale());
    ctx.output.kv("NGN per USD", &format!("{rate} ({source})"));
}
