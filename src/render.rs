//! HTML and terminal rendering of analysis results and the upload page.

use std::fmt::Write as _;

use pulldown_cmark::escape::{escape_href, escape_html};
use url::Url;

use crate::acquisition::camera::CaptureMode;
use crate::analysis::AnalysisResult;
use crate::theme::Theme;

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let _ = escape_html(&mut out, text);
    out
}

/// Only absolute http(s) links are rendered as anchors.
fn safe_href(link: &str) -> Option<String> {
    let url = Url::parse(link.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    let mut out = String::new();
    let _ = escape_href(&mut out, link.trim());
    Some(out)
}

pub fn result_html(analysis: &AnalysisResult) -> String {
    let mut html = String::new();
    html.push_str("<section class=\"results\">\n");

    let _ = write!(
        html,
        "<div class=\"card\"><div class=\"card-icon\">🔍</div><div>\
         <h3 class=\"face-shape-heading\">Your Face Shape: <span class=\"accent\">{}</span></h3>\
         <p class=\"muted\">{}</p></div></div>\n",
        escape(&analysis.face_shape),
        escape(&analysis.explanation_face_shape)
    );

    html.push_str(
        "<div class=\"card\"><div class=\"card-header\"><div class=\"card-icon\">👓</div><div>\
         <h3>Recommended Glasses Styles</h3>\
         <p class=\"muted small\">These styles will complement your face shape beautifully</p>\
         </div></div>\n<div class=\"style-grid\">\n",
    );
    for item in &analysis.recommended_styles {
        let title = match safe_href(&item.link) {
            Some(href) => format!(
                "<a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\"><h4><span class=\"dot\"></span>{} <span class=\"small\">↗</span></h4></a>",
                href,
                escape(&item.style)
            ),
            None => format!("<h4><span class=\"dot\"></span>{}</h4>", escape(&item.style)),
        };
        let _ = write!(
            html,
            "<div class=\"style-card\">{}<p class=\"muted small\">{}</p></div>\n",
            title,
            escape(&item.reason)
        );
    }
    html.push_str("</div></div>\n");

    html.push_str(
        "<div class=\"card\"><div class=\"card-header\"><div class=\"card-icon\">⭐</div><div>\
         <h3>Celebrity Face Shape Matches</h3>\
         <p class=\"muted small\">You share a similar face shape with these celebrities</p>\
         </div></div>\n<div class=\"celebrity-list\">",
    );
    for celebrity in &analysis.celebrities {
        let _ = write!(
            html,
            "<span class=\"celebrity-chip\"><span class=\"small\">🌟</span> {}</span>",
            escape(celebrity)
        );
    }
    html.push_str("</div></div>\n</section>\n");
    html
}

pub fn result_text(analysis: &AnalysisResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Your face shape: {}", analysis.face_shape);
    if !analysis.explanation_face_shape.trim().is_empty() {
        let _ = writeln!(out, "  {}", analysis.explanation_face_shape.trim());
    }

    out.push_str("\nRecommended glasses styles:\n");
    if analysis.recommended_styles.is_empty() {
        out.push_str("  (none)\n");
    }
    for (index, item) in analysis.recommended_styles.iter().enumerate() {
        let _ = writeln!(out, "  {}. {}", index + 1, item.style);
        if !item.reason.trim().is_empty() {
            let _ = writeln!(out, "     {}", item.reason.trim());
        }
        if !item.link.trim().is_empty() {
            let _ = writeln!(out, "     {}", item.link.trim());
        }
    }

    out.push_str("\nCelebrity face shape matches:\n");
    if analysis.celebrities.is_empty() {
        out.push_str("  (none)\n");
    } else {
        let _ = writeln!(out, "  {}", analysis.celebrities.join(", "));
    }
    out
}

pub struct PageView<'a> {
    pub theme: Theme,
    pub capture_mode: CaptureMode,
    pub notice: Option<&'a str>,
    pub result: Option<&'a AnalysisResult>,
    pub max_upload_bytes: usize,
}

fn camera_controls(mode: CaptureMode) -> &'static str {
    match mode {
        CaptureMode::NativePicker => {
            "<label class=\"button success\"><span>📷</span> Take Photo\
             <input type=\"file\" name=\"image\" accept=\"image/*\" capture=\"user\" hidden data-autosubmit></label>"
        }
        CaptureMode::LiveFeed => {
            "<button type=\"button\" class=\"button success\" id=\"open-camera\"><span>📷</span> Take Photo</button>\
             <input type=\"file\" name=\"image\" id=\"camera-upload\" accept=\"image/*\" hidden>"
        }
    }
}

const LIVE_FEED_VIEW: &str = "<div id=\"camera-view\" class=\"camera-view\" hidden>\
<video id=\"camera-video\" autoplay playsinline muted></video>\
<div class=\"actions\"><button type=\"button\" class=\"button\" id=\"camera-capture\">Capture</button>\
<button type=\"button\" class=\"button ghost\" id=\"camera-cancel\">Cancel</button></div></div>\n";

const PAGE_STYLE: &str = r#"<style>
:root{--background:#f8fafc;--foreground:#0f172a;--card:#fff;--card-border:#e2e8f0;--muted:#f1f5f9;--muted-foreground:#64748b;--accent:#3b82f6;--success:#10b981}
[data-theme="dark"]{--background:#0b1120;--foreground:#f1f5f9;--card:#111827;--card-border:#1f2937;--muted:#1e293b;--muted-foreground:#94a3b8;--accent:#60a5fa;--success:#34d399}
body{margin:0;font-family:system-ui,sans-serif;background:var(--background);color:var(--foreground)}
.container{max-width:56rem;margin:0 auto;padding:2rem 1rem}
header{display:flex;justify-content:space-between;align-items:center;margin-bottom:3rem}
.theme-toggle{width:3rem;height:3rem;border-radius:.75rem;border:1px solid var(--card-border);background:var(--card);display:flex;align-items:center;justify-content:center;text-decoration:none;font-size:1.25rem}
.card,.drop-zone{background:var(--card);border:1px solid var(--card-border);border-radius:1rem;padding:1.5rem;margin-bottom:1.5rem}
.card{display:flex;flex-direction:column;gap:1rem}.card-header{display:flex;gap:1rem}.card-icon{font-size:1.5rem}
.drop-zone{position:relative;border:2px dashed var(--card-border);text-align:center}
.drop-zone.dragging{border-color:var(--accent)}
.muted{color:var(--muted-foreground)}.small{font-size:.85rem}.accent{color:var(--accent)}
.button{display:inline-flex;gap:.5rem;align-items:center;padding:.75rem 1.5rem;border-radius:.75rem;border:0;background:var(--accent);color:#fff;font-weight:500;cursor:pointer;text-decoration:none}
.button.success{background:var(--success)}.button.ghost{background:transparent;color:var(--foreground);border:1px solid var(--card-border)}
.actions{display:flex;gap:.75rem;justify-content:center;flex-wrap:wrap}
.style-card{background:var(--muted);border:1px solid var(--card-border);border-radius:.75rem;padding:1rem;margin-bottom:.75rem}
.style-card a{color:inherit}.dot{display:inline-block;width:.5rem;height:.5rem;border-radius:50%;background:var(--accent);margin-right:.5rem}
.celebrity-list{display:flex;flex-wrap:wrap;gap:.5rem}
.celebrity-chip{background:var(--muted);border:1px solid var(--card-border);border-radius:.5rem;padding:.5rem .75rem;font-weight:500}
.notice{background:var(--muted);border-left:4px solid #f59e0b;padding:.75rem 1rem;border-radius:.5rem}
.camera-view video{max-width:100%;border-radius:.75rem}
.loading-indicator{display:none;text-align:center;padding:3rem 0}
body.loading .loading-indicator{display:block}
body.loading #results{display:none}
footer{margin-top:4rem;padding-top:2rem;border-top:1px solid var(--card-border);text-align:center}
</style>
"#;

pub fn index_page(view: &PageView<'_>) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html lang=\"en\" data-theme=\"{}\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>Face &amp; Frames</title>\n{}</head>\n<body>\n<div class=\"container\">\n",
        view.theme.as_attr(),
        PAGE_STYLE
    );

    let _ = write!(
        html,
        "<header><div><h1>👓 Face &amp; Frames</h1>\
         <p class=\"muted\">Find the perfect glasses for your face shape</p></div>\
         <a class=\"theme-toggle\" href=\"/theme/toggle\" aria-label=\"Toggle theme\">{}</a></header>\n<main>\n",
        view.theme.toggle_icon()
    );

    let _ = write!(
        html,
        "<form id=\"upload-form\" method=\"post\" action=\"/\" enctype=\"multipart/form-data\">\n\
         <div id=\"drop-zone\" class=\"drop-zone\">\n\
         <div class=\"muted\" style=\"font-size:3rem\">🖼️</div>\n\
         <h3>Upload your photo</h3>\n\
         <p class=\"muted\">Choose a clear, well-lit photo where your face is fully visible for the best results</p>\n\
         <div class=\"actions\">\
         <label class=\"button\"><span>📁</span> Browse Files\
         <input type=\"file\" name=\"image\" id=\"file-input\" accept=\"image/*\" hidden data-autosubmit></label>\
         {}</div>\n{}\
         <p id=\"camera-notice\" class=\"notice\" hidden></p>\n\
         <p class=\"muted small\">Supported formats: JPG, PNG, WebP • Max size: {} MB</p>\n\
         <noscript><button type=\"submit\" class=\"button\">Analyze</button></noscript>\n\
         </div>\n</form>\n",
        camera_controls(view.capture_mode),
        if view.capture_mode == CaptureMode::LiveFeed {
            LIVE_FEED_VIEW
        } else {
            ""
        },
        view.max_upload_bytes / (1024 * 1024)
    );

    html.push_str(
        "<div class=\"loading-indicator\"><p><strong>Analyzing your face shape...</strong></p></div>\n",
    );

    if let Some(notice) = view.notice {
        let _ = write!(html, "<p class=\"notice\" role=\"alert\">{}</p>\n", escape(notice));
    }

    match view.result {
        Some(result) => {
            let _ = write!(
                html,
                "<div id=\"results\"><div class=\"card-header\" style=\"justify-content:space-between\">\
                 <h2>Your Results</h2><a class=\"button ghost small\" href=\"/\">Try Another Photo</a></div>\n{}</div>\n",
                result_html(result)
            );
        }
        None if view.notice.is_none() => {
            html.push_str(
                "<div class=\"card\" style=\"text-align:center\"><div style=\"font-size:3rem\">📸</div>\
                 <h3>Ready to find your perfect frames?</h3>\
                 <p class=\"muted\">Upload a clear photo of your face and we&#x27;ll analyze your face shape \
                 to recommend the best glasses styles for you.</p></div>\n",
            );
        }
        None => {}
    }

    html.push_str(
        "</main>\n<footer><p class=\"muted small\">AI-powered face analysis for better glasses recommendations</p></footer>\n\
         </div>\n<script src=\"/static/app.js\" defer></script>\n</body>\n</html>\n",
    );
    html
}
