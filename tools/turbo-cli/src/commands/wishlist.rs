//! Wishlist commands.

use anyhow::Result;
use turbo_commerce::CommerceState;

use super::cart::parse_id;
use super::{WishlistArgs, WishlistCommand};
use crate::context::Context;

/// Run the wishlist command.
pub async fn run(args: WishlistArgs, ctx: &Context) -> Result<()> {
    let mut state = ctx.open_state().await?;

    match args.command {
        WishlistCommand::Toggle { product } => {
            let product = ctx.load_product(&state, &product).await?;
            let (_, ticket) = state.toggle_wishlist(&product)?;
            ctx.output.sync_result(&ticket.outcome().await);
        }
        WishlistCommand::Remove { id } => {
            let id = parse_id(&state, &id)?;
            let was_saved = state.is_in_wishlist(&id);
            let ticket = state.remove_from_wishlist(&id);
            if was_saved {
                ctx.output.success(&format!("Removed {id} from wishlist"));
            }
            ctx.output.sync_result(&ticket.outcome().await);
        }
        WishlistCommand::Move { id, quantity } => {
            let id = parse_id(&state, &id)?;
            let ticket = state.move_to_cart(&id, quantity)?;
            ctx.output.sync_result(&ticket.outcome().await);
        }
        WishlistCommand::Show => {}
    }

    show_wishlist(&state, ctx);
    Ok(())
}

fn show_wishlist(state: &CommerceState, ctx: &Context) {
    if ctx.output.is_json() {
        ctx.output.json(&state.wishlist());
        return;
    }

    ctx.output
        .header(&format!("Wishlist ({})", state.wishlist_count()));
    if state.wishlist().is_empty() {
        ctx.output.info("No saved products");
        return;
    }

    for product in state.wishlist().items() {
        let mut line = format!(
            "{} {} {}",
            product.id,
            product.name,
            state.format_price(Some(product.price))
        );
        if let Some(pct) = product.discount_percentage() {
            line.push_str(&format!(" (-{pct:.0}%)"));
        }
        let options: Vec<String> = product
            .inventory
            .iter()
            .flat_map(|inventory| inventory.in_stock_variants())
            .map(|variant| format!("{} x{}", variant.label(), variant.stock))
            .collect();
        if !product.is_in_stock() {
            line.push_str(" [out of stock]");
        } else if !options.is_empty() {
            line.push_str(&format!(" [{}]", options.join(", ")));
        }
        ctx.output.list_item(&line);
    }
}
