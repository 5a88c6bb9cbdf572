//! Diagnostic HTML rendering. Every step of both flows dumps its raw
//! status/payload so the demo can be debugged from the browser.

use crate::counters::SessionCounters;
use crate::providers::{IdTokenClaims, VerificationOutcome};

pub fn render_page(title: &str, body_html: &str) -> String {
    format!(
        r#"<!doctype html>
<html><head><meta charset="utf-8"><title>{title}</title>
<style>
body{{font-family:system-ui,Arial;margin:24px;max-width:900px}}
pre{{background:#f5f5f5;padding:12px;overflow:auto}}
textarea{{width:100%;font-family:monospace}}
.ok{{color:#0a0}} .err{{color:#a00}}
</style></head>
<body>
<h2>{title}</h2>
{body_html}
</body></html>
"#,
        title = escape(title),
    )
}

pub fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn error_page(title: &str, message: &str, detail: Option<&str>) -> String {
    let mut body = format!("<p class=\"err\">{}</p>", escape(message));
    if let Some(detail) = detail {
        body.push_str(&format!("<pre>{}</pre>", escape(detail)));
    }
    render_page(title, &body)
}

pub fn home_page() -> &'static str {
    include_str!("server/html/home.html")
}

pub fn google_success_page(
    claims: &IdTokenClaims,
    phone: Option<&str>,
    id_token: Option<&str>,
    access_token: &str,
) -> String {
    let field = |value: Option<&str>| escape(value.unwrap_or("N/A"));
    let next_step = match phone {
        Some(_) => {
            r#"<p><a href="/auth/number-verification-auto">Verify phone number automatically</a></p>"#
        }
        None => r#"<p><a href="/frontend/number-verification">Verify number (manual)</a></p>"#,
    };
    let body = format!(
        r#"<p class="ok">Google authentication successful.</p>
<h3>User data</h3>
<ul>
<li><strong>Name:</strong> {name}</li>
<li><strong>Email:</strong> {email}</li>
<li><strong>ID:</strong> {sub}</li>
<li><strong>Verified:</strong> {verified}</li>
<li><strong>Phone number:</strong> {phone}</li>
</ul>
<h3>ID token</h3>
<textarea readonly rows="5">{id_token}</textarea>
<h3>Access token</h3>
<textarea readonly rows="4">{access_token}</textarea>
{next_step}
<p><a href="/">Back to home</a></p>"#,
        name = field(claims.name.as_deref()),
        email = field(claims.email.as_deref()),
        sub = field(claims.sub.as_deref()),
        verified = claims
            .email_verified
            .map_or("N/A".to_string(), |verified| verified.to_string()),
        phone = field(phone.or(Some("Not available"))),
        id_token = escape(id_token.unwrap_or("")),
        access_token = escape(access_token),
    );
    render_page("Google Authentication", &body)
}

pub fn verification_page(phone: &str, outcome: &VerificationOutcome) -> String {
    let (class, verdict) = if outcome.verified {
        ("ok", "Number matches device SIM")
    } else {
        ("err", "Number does NOT match device SIM")
    };
    let raw = serde_json::to_string_pretty(&outcome.raw).unwrap_or_else(|_| outcome.raw.to_string());
    let body = format!(
        r#"<p class="{class}">{verdict}</p>
<ul>
<li><strong>Verified number:</strong> {phone}</li>
<li><strong>devicePhoneNumberVerified:</strong> {verified}</li>
</ul>
<h3>Complete JSON response</h3>
<pre>{raw}</pre>
<p><a href="/">Back to home</a></p>"#,
        phone = escape(phone),
        verified = outcome.verified,
        raw = escape(&raw),
    );
    let title = if outcome.verified {
        "Number Verification - Success"
    } else {
        "Number Verification - Failed"
    };
    render_page(title, &body)
}

pub fn manual_verification_page(
    client_id: &str,
    scope: &str,
    redirect_uri: &str,
    authorize_url: &str,
    default_phone: &str,
) -> String {
    // Authorization must start from the user's device, so the authorize URL
    // is assembled client-side.
    let body = format!(
        r#"<p>The Number Verification API must run from the user's device so the
operator can confirm the number belongs to that device.</p>
<form id="nv-form">
<label for="phone">Phone number:</label>
<input type="text" id="phone" name="phone" value="{default_phone}" required>
<button type="submit">Verify number</button>
</form>
<div id="result"></div>
<script>
var CLIENT_ID = "{client_id}";
var SCOPE = "{scope}";
var REDIRECT_URI = "{redirect_uri}";
var AUTHORIZE_URL = "{authorize_url}";
document.getElementById('nv-form').addEventListener('submit', function (e) {{
    e.preventDefault();
    var params = new URLSearchParams({{
        response_type: 'code',
        client_id: CLIENT_ID,
        scope: SCOPE,
        redirect_uri: REDIRECT_URI,
        state: document.getElementById('phone').value
    }});
    window.location.href = AUTHORIZE_URL + '?' + params.toString();
}});
</script>"#,
        client_id = escape(client_id),
        scope = escape(scope),
        redirect_uri = escape(redirect_uri),
        authorize_url = escape(authorize_url),
        default_phone = escape(default_phone),
    );
    render_page("Number Verification - Frontend", &body)
}

pub fn authorize_probe_page(url: &str, status: u16, headers: &str, body_text: &str) -> String {
    let body = format!(
        r#"<h3>Direct call to the authorize endpoint</h3>
<p><strong>URL:</strong> {url}</p>
<p><strong>Status code:</strong> {status}</p>
<p><strong>Headers:</strong></p><pre>{headers}</pre>
<p><strong>Body:</strong></p><pre>{body}</pre>"#,
        url = escape(url),
        headers = escape(headers),
        body = escape(body_text),
    );
    render_page("Test authorize endpoint", &body)
}

pub fn relay_page(
    providers: &[String],
    counters: &SessionCounters,
    selected: &str,
    prompt: &str,
    last_response: Option<&str>,
) -> String {
    let mut counter_rows = String::new();
    for (provider, tally) in counters.iter() {
        counter_rows.push_str(&format!(
            "<li>Successful call to {provider}: {success} &mdash; Incorrect call to {provider}: {error}</li>\n",
            provider = escape(provider),
            success = tally.success,
            error = tally.error,
        ));
    }

    let mut options = String::new();
    for provider in providers {
        let selected_attr = if provider == selected { " selected" } else { "" };
        options.push_str(&format!(
            "<option value=\"{value}\"{selected_attr}>{value}</option>\n",
            value = escape(provider),
        ));
    }

    let response_box = last_response.map_or_else(String::new, |text| {
        format!(
            "<h3>Response from {provider}</h3>\n<pre>{text}</pre>",
            provider = escape(selected),
            text = escape(text),
        )
    });

    let body = format!(
        r#"<ul>
{counter_rows}</ul>
<form method="post" action="/send">
<label for="provider">Select provider:</label>
<select id="provider" name="provider">
{options}</select>
<label for="prompt">Ask your question:</label>
<textarea id="prompt" name="prompt" rows="4">{prompt}</textarea>
<button type="submit">Send</button>
</form>
{response_box}"#,
        prompt = escape(prompt),
    );
    render_page("AI Gateway Relay", &body)
}
