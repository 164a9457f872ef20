//! Static pages and the post-login greeting.
use crate::id_token::IdentityClaims;

pub const LANDING: &str = r#"<html>
	<body>
		<a href="/login">Login with Google</a>
	</body>
</html>
"#;

pub const LOGIN_REQUIRED: &str = r#"<html>
	<body>
		<p>You need to login to be able to see this page</p>
		<a href="/login">Login with Google</a>
	</body>
</html>
"#;

const LINKS: &str = r#"		<a href="/profile" style="display: block;">See user's profile</a>
		<a href="/files" style="display: block;">See User's Google Drive files names</a>
		<a href="/token" style="display: block;">See Token details</a>
"#;

/// Page shown after a successful callback. Without claims only the links are shown.
pub fn greeting(claims: Option<&IdentityClaims>) -> String {
    let mut body = String::new();
    if let Some(claims) = claims {
        let first_name = claims
            .name
            .as_deref()
            .and_then(|name| name.split_whitespace().next())
            .unwrap_or("there");
        body.push_str(&format!("\t\t<p>Welcome back, {}</p>\n", escape_html(first_name)));
        if let Some(email) = claims.email.as_deref() {
            body.push_str(&format!(
                "\t\t<p>Your email is: {}</p>\n",
                escape_html(&mask_email(email))
            ));
        }
    } else {
        body.push_str("\t\t<p>Welcome back</p>\n");
    }
    format!("<html>\n\t<body>\n{}{}\t</body>\n</html>\n", body, LINKS)
}

/// Keeps the first three characters of an address and hides the rest.
pub fn mask_email(email: &str) -> String {
    let visible: String = email.chars().take(3).collect();
    format!("{}*********@******", visible)
}

fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

// ==========Tests==========
#[cfg(test)]
mod tests {
    use crate::id_token::IdentityClaims;

    use super::{greeting, mask_email};

    #[test]
    fn test_mask_email() {
        assert_eq!(mask_email("ada@example.com"), "ada*********@******");
        assert_eq!(mask_email("a@"), "a@*********@******");
        assert_eq!(mask_email(""), "*********@******");
    }

    #[test]
    fn test_greeting_with_claims() {
        let claims = IdentityClaims {
            subject: "123".to_string(),
            email: Some("ada@example.com".to_string()),
            name: Some("Ada Lovelace".to_string()),
        };
        let page = greeting(Some(&claims));
        assert!(page.contains("Welcome back, Ada</p>"));
        assert!(page.contains("Your email is: ada*********@******"));
        assert!(page.contains(r#"href="/files""#));
        assert!(page.contains(r#"href="/token""#));
        assert!(page.contains(r#"href="/profile""#));
    }

    #[test]
    fn test_greeting_escapes_name() {
        let claims = IdentityClaims {
            subject: "123".to_string(),
            email: None,
            name: Some("<script>alert(1)</script>".to_string()),
        };
        let page = greeting(Some(&claims));
        assert!(!page.contains("<script>"));
        assert!(page.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_greeting_without_claims() {
        let page = greeting(None);
        assert!(page.contains("Welcome back</p>"));
        assert!(page.contains(r#"href="/files""#));
    }
}
