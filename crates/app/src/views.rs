use pdf_page_search_core::{DocumentInfo, SearchResult};
use std::fmt::Write;

const STYLE: &str = "body{font-family:sans-serif;max-width:52rem;margin:2rem auto;padding:0 1rem}\
.result{border-top:1px solid #ddd;padding:.75rem 0}.meta{color:#555;font-size:.9rem}";

/// Basic HTML escaping for text and attribute content
fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!doctype html>\n<html><head><meta charset=\"utf-8\"><title>{}</title>\
<style>{STYLE}</style></head><body>{body}</body></html>\n",
        escape(title)
    )
}

const SEARCH_FORM: &str = "<form action=\"/search\" method=\"post\">\
<input type=\"text\" name=\"query\" placeholder=\"Search the document\" required>\
<button type=\"submit\">Search</button></form>";

pub fn upload_page(loaded: Option<&DocumentInfo>) -> String {
    let mut body = String::from(
        "<h1>PDF page search</h1>\
<form action=\"/\" method=\"post\" enctype=\"multipart/form-data\">\
<input type=\"file\" name=\"file\" accept=\".pdf\" required>\
<button type=\"submit\">Upload</button></form>",
    );

    if let Some(info) = loaded {
        let _ = write!(
            body,
            "<p class=\"uploaded\">Uploaded: <strong>{}</strong> \
({} pages with text)</p>{SEARCH_FORM}",
            escape(&info.file_name),
            info.page_count
        );
    }

    layout("PDF page search", &body)
}

pub fn results_page(query: &str, results: &[SearchResult]) -> String {
    let mut body = format!(
        "<h1>Results for &ldquo;{}&rdquo;</h1>{SEARCH_FORM}",
        escape(query)
    );

    if results.is_empty() {
        body.push_str("<p>No pages matched.</p>");
    }
    for result in results {
        let _ = write!(
            body,
            "<div class=\"result\"><h2>Page {}</h2>\
<p class=\"meta\">Occurrences: {}</p><p>{}</p></div>",
            result.page,
            result.count,
            escape(&result.preview)
        );
    }
    body.push_str("<p><a href=\"/\">Upload another PDF</a></p>");

    layout("Search results", &body)
}
