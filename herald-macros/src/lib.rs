use proc_macro::TokenStream;

mod domain_event;

/// 领域事件派生宏
/// - 仅支持具名字段结构体
/// - 生成 `::herald_domain::domain_event::DomainEvent` 实现（name/occurred_at/as_any）
/// - 必填：`#[event(name = "auth.session.created")]`，事件名不可为空
/// - 可选：`#[event(occurred_at = session.created_at)]` 指定发生时间的字段路径，
///   缺省时使用名为 `occurred_at` 的字段
#[proc_macro_derive(DomainEvent, attributes(event))]
pub fn derive_domain_event(item: TokenStream) -> TokenStream {
    domain_event::expand(item)
}
