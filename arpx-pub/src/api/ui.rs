//! Upload form landing page

use axum::response::{Html, IntoResponse};
use axum::{routing::get, Router};

use crate::AppState;

/// GET /
///
/// Minimal upload form: a photo, a video, one button.
pub async fn upload_page() -> impl IntoResponse {
    let version = env!("CARGO_PKG_VERSION");
    let build_timestamp = env!("BUILD_TIMESTAMP");
    let git_hash = env!("GIT_HASH");

    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>ARPX Publisher</title>
    <style>
        * {{
            margin: 0;
            padding: 0;
            box-sizing: border-box;
        }}
        body {{
            font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif;
            background-color: #1a1a1a;
            color: #e0e0e0;
            line-height: 1.6;
        }}
        .container {{
            max-width: 480px;
            margin: 0 auto;
            padding: 40px 20px;
        }}
        h1 {{
            margin-bottom: 8px;
        }}
        p.sub {{
            color: #9a9a9a;
            margin-bottom: 30px;
        }}
        label {{
            display: block;
            margin: 18px 0 6px;
        }}
        input[type="file"] {{
            width: 100%;
            padding: 10px;
            background-color: #2a2a2a;
            border: 1px solid #3a3a3a;
            border-radius: 4px;
            color: #e0e0e0;
        }}
        button {{
            margin-top: 24px;
            width: 100%;
            padding: 12px;
            background-color: #2d6cdf;
            border: none;
            border-radius: 4px;
            color: #fff;
            font-size: 16px;
            cursor: pointer;
        }}
        pre {{
            margin-top: 24px;
            padding: 12px;
            background-color: #2a2a2a;
            border-radius: 4px;
            white-space: pre-wrap;
            word-break: break-all;
        }}
        footer {{
            margin-top: 40px;
            color: #6a6a6a;
            font-size: 12px;
        }}
    </style>
</head>
<body>
    <div class="container">
        <h1>Publish an AR experience</h1>
        <p class="sub">Upload a photo and the video to overlay on it.</p>
        <form id="upload-form">
            <label for="photo">Reference photo (jpg, png)</label>
            <input type="file" id="photo" name="photo" accept=".jpg,.jpeg,.png" required>
            <label for="video">Overlay video (mp4, mov, m4v)</label>
            <input type="file" id="video" name="video" accept=".mp4,.mov,.m4v" required>
            <button type="submit">Publish</button>
        </form>
        <pre id="result" hidden></pre>
        <footer>arpx-pub v{version} &middot; built {build_timestamp} &middot; {git_hash}</footer>
    </div>
    <script>
        const form = document.getElementById('upload-form');
        const result = document.getElementById('result');
        form.addEventListener('submit', async (e) => {{
            e.preventDefault();
            result.hidden = false;
            result.textContent = 'Publishing...';
            const resp = await fetch('/upload', {{
                method: 'POST',
                body: new FormData(form),
            }});
            const body = await resp.json();
            if (body.status === 'published') {{
                let text = 'Published!\n' + body.entry_url;
                if (body.handout_url) text += '\nHand-out: ' + body.handout_url;
                if (body.warnings) text += '\n' + body.warnings.join('\n');
                result.textContent = text;
            }} else {{
                result.textContent = 'Failed at ' + (body.stage || 'request') + ':\n'
                    + (body.detail || JSON.stringify(body));
            }}
        }});
    </script>
</body>
</html>
"#
    );

    Html(html)
}

/// Build UI routes
pub fn ui_routes() -> Router<AppState> {
    Router::new().route("/", get(upload_page))
}
