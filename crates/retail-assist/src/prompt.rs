//! Prompt text sent to the model.

use retail_core::geo::RankedFacility;
use retail_core::types::CustomerRecord;

pub const SYSTEM_PROMPT: &str = "You are a hyper-personalized retail assistant for a coffee shop chain.

Your role:
- Provide helpful, specific, and context-aware responses
- Use customer history and preferences to personalize suggestions
- Mention nearby stores, distances, and operating hours when relevant
- Highlight available coupons and discounts
- Be warm, friendly, and concise
- If the user expresses a need (like \"I'm cold\"), proactively suggest relevant products

Guidelines:
- Always prioritize customer satisfaction
- Use the provided context to give specific answers
- Don't make up information not in the context
- Keep responses conversational and natural
";

const RECENT_ORDERS_SHOWN: usize = 3;

/// Everything the user prompt is rendered from. All text must already be masked.
pub struct PromptContext<'a> {
    pub customer: Option<&'a CustomerRecord>,
    pub facility: Option<&'a RankedFacility>,
    pub documents: &'a [String],
    pub message: &'a str,
}

/// Render the user prompt. Sections appear in a fixed order (customer, store,
/// knowledge, message) and are left out when their data is absent.
pub fn render_user_prompt(ctx: &PromptContext<'_>) -> String {
    let mut lines: Vec<String> = Vec::new();

    if let Some(c) = ctx.customer {
        lines.push("=== CUSTOMER CONTEXT ===".into());
        lines.push(format!("Name: {}", c.name));
        lines.push(format!("Phone: {}", c.phone));
        if let Some(email) = &c.email {
            lines.push(format!("Email: {email}"));
        }
        lines.push(format!("Loyalty Level: {}", c.loyalty_level.as_deref().unwrap_or("N/A")));
        lines.push(format!("Preferred Drink: {}", c.preferred_drink.as_deref().unwrap_or("N/A")));

        if !c.recent_orders.is_empty() {
            lines.push(format!("\nRecent Orders ({}):", c.recent_orders.len()));
            for order in c.recent_orders.iter().take(RECENT_ORDERS_SHOWN) {
                lines.push(format!("  - {} ({}) - {}", order.item_name, order.size, order.status));
            }
        }
        if !c.active_coupons.is_empty() {
            lines.push(format!("\nActive Coupons ({}):", c.active_coupons.len()));
            for coupon in &c.active_coupons {
                lines.push(format!("  - {} (valid until {})", coupon.description, coupon.valid_until));
            }
        }
        lines.push(String::new());
    }

    if let Some(r) = ctx.facility {
        let f = &r.facility;
        lines.push("=== NEARBY STORE ===".into());
        lines.push(format!("Name: {}", f.name));
        lines.push(format!("Distance: {}m away", r.distance_m));
        lines.push(format!("Address: {}", f.address));
        lines.push(format!("Hours: {} - {}", f.open_time, f.close_time));
        lines.push(String::new());
    }

    if !ctx.documents.is_empty() {
        lines.push("=== RELEVANT INFORMATION ===".into());
        for (i, doc) in ctx.documents.iter().enumerate() {
            lines.push(format!("[Document {}]", i + 1));
            lines.push(doc.trim().to_string());
            lines.push(String::new());
        }
    }

    lines.push("=== CUSTOMER MESSAGE ===".into());
    lines.push(ctx.message.to_string());

    lines.join("\n")
}
