use axum::response::Html;

const INDEX_HTML: &str = include_str!("../../static/index.html");

// single page: upload, extracted context, question, answer
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}
