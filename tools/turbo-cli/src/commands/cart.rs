//! Cart commands.

use anyhow::Result;
use serde::Serialize;
use turbo_commerce::cart::CartLineItem;
use turbo_commerce::{CommerceState, ProductId};

use super::{CartArgs, CartCommand};
use crate::context::Context;
use crate::output::stock_badge;

/// Run the cart command.
pub async fn run(args: CartArgs, ctx: &Context) -> Result<()> {
    let mut state = ctx.open_state().await?;

    match args.command {
        CartCommand::Add { product, quantity } => {
            let product = ctx.load_product(&state, &product).await?;
            let ticket = state.add_to_cart(&product, quantity)?;
            ctx.output.sync_result(&ticket.outcome().await);
        }
        CartCommand::Remove { id } => {
            let id = parse_id(&state, &id)?;
            if !state.cart().contains(&id) {
                ctx.output.warn(&format!("{id} is not in the cart"));
            }
            let ticket = state.remove_from_cart(&id);
            ctx.output.sync_result(&ticket.outcome().await);
        }
        CartCommand::Set { id, quantity } => {
            let id = parse_id(&state, &id)?;
            if quantity < 1 || !state.cart().contains(&id) {
                ctx.output.debug("Nothing to update");
            }
            let ticket = state.update_quantity(&id, quantity)?;
            ctx.output.sync_result(&ticket.outcome().await);
        }
        CartCommand::Clear => {
            let ticket = state.clear_cart();
            ctx.output.success("Cart cleared");
            ctx.output.sync_result(&ticket.outcome().await);
        }
        CartCommand::Show => {}
    }

    if state.session().active_tier()?.is_none() {
        ctx.output
            .warn("No active session; run `turbo session sign-in` to keep changes");
    }

    show_cart(&state, ctx);
    Ok(())
}

pub(crate) fn parse_id(state: &CommerceState, id: &str) -> Result<ProductId> {
    Ok(ProductId::parse(id).map_err(|e| state.report(e))?)
}

#[derive(Serialize)]
struct CartView<'a> {
    lines: &'a [CartLineItem],
    count: u64,
    total: f64,
    currency: &'static str,
    display_total: String,
}

fn show_cart(state: &CommerceState, ctx: &Context) {
    let total = state.cart_total();
    let display_total = state.format_price(Some(total));

    if ctx.output.is_json() {
        ctx.output.json(&CartView {
            lines: state.cart_lines(),
            count: state.cart_count(),
            total: total.to_major(),
            currency: state.selected_currency().code(),
            display_total,
        });
        return;
    }

    ctx.output.header("Cart");
    if state.cart().is_empty() {
        ctx.output.info("Your cart is empty");
        return;
    }

    let widths = [12, 28, 5, 12, 14];
    ctx.output
        .table_row(&["ID", "NAME", "QTY", "SUBTOTAL", "STOCK"], &widths);
    for line in state.cart_lines() {
        let quantity = line.quantity.to_string();
        let subtotal = state.format_price(Some(line.line_total()));
        let stock = stock_badge(line.max_available());
        ctx.output.table_row(
            &[
                line.id.as_str(),
                line.name.as_str(),
                quantity.as_str(),
                subtotal.as_str(),
                stock.as_str(),
            ],
            &widths,
        );
    }
    ctx.output.kv("items", &state.cart_count().to_string());
    ctx.output.kv("total", &display_total);
}
