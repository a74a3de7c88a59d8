//! Message templates
//!
//! Pure functions from a template and its parameters to subject and body.
//! Email bodies are HTML; Telegram bodies use Telegram's HTML parse mode.
//! Every interpolated value is escaped.

use std::fmt::Write;

/// A message to render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template<'a> {
    /// Email with the link that verifies the address
    VerifyEmail { link: &'a str },
    /// Email with the link to the password reset page
    PasswordReset { link: &'a str, ttl_minutes: i64 },
    /// Telegram message carrying a password recovery code
    RecoveryCode { code: &'a str, ttl_minutes: i64 },
    /// Telegram message confirming a chat was bound to an account
    LinkWelcome { name: &'a str, email: &'a str },
    /// Telegram message confirming a pending registration became an account
    AccountCreated { name: &'a str, email: &'a str },
}

/// Rendered message. Telegram messages have no subject line; theirs is used
/// only as a log label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub subject: &'static str,
    pub body: String,
}

pub fn render_template(template: &Template<'_>) -> Rendered {
    match *template {
        Template::VerifyEmail { link } => Rendered {
            subject: "Подтверждение email - СУДУ",
            body: email_layout(
                "Система управления учебным процессом",
                "Добро пожаловать в СУДУ!",
                "Для завершения регистрации и активации вашего аккаунта подтвердите ваш email адрес.",
                link,
                "Подтвердить Email",
                "Если вы не регистрировались в СУДУ, проигнорируйте это письмо.",
            ),
        },
        Template::PasswordReset { link, ttl_minutes } => Rendered {
            subject: "Восстановление пароля - СУДУ",
            body: email_layout(
                "Восстановление доступа",
                "Восстановление пароля",
                "Для восстановления доступа к вашему аккаунту перейдите по ссылке ниже:",
                link,
                "Восстановить пароль",
                &format!(
                    "Если вы не запрашивали восстановление пароля, проигнорируйте это письмо.<br>\
                     Ссылка действительна {}.",
                    validity_phrase(ttl_minutes)
                ),
            ),
        },
        Template::RecoveryCode { code, ttl_minutes } => Rendered {
            subject: "recovery code",
            body: format!(
                "🔐 <b>Восстановление пароля СУДУ</b>\n\n\
                 Ваш код: <code>{}</code>\n\n\
                 Код действителен {}.\n\
                 Если вы не запрашивали восстановление, просто проигнорируйте это сообщение.",
                escape_html(code),
                validity_phrase(ttl_minutes)
            ),
        },
        Template::LinkWelcome { name, email } => Rendered {
            subject: "telegram linked",
            body: format!(
                "✅ <b>Telegram успешно привязан!</b>\n📧 {}\n👤 {}\n\n\
                 Теперь коды восстановления пароля будут приходить в этот чат.",
                escape_html(email),
                escape_html(name)
            ),
        },
        Template::AccountCreated { name, email } => Rendered {
            subject: "account created",
            body: format!(
                "🎉 <b>Регистрация в СУДУ завершена!</b>\n📧 {}\n👤 {}\n\n\
                 Теперь вы можете войти на сайте, а коды восстановления пароля будут приходить сюда.",
                escape_html(email),
                escape_html(name)
            ),
        },
    }
}

fn validity_phrase(ttl_minutes: i64) -> String {
    match ttl_minutes {
        60 => "в течение 1 часа".to_string(),
        m if m > 0 && m % 60 == 0 => format!("в течение {} ч.", m / 60),
        m => format!("в течение {m} минут"),
    }
}

fn email_layout(
    tagline: &str,
    heading: &str,
    lead: &str,
    link: &str,
    button: &str,
    footnote: &str,
) -> String {
    let link = escape_html(link);
    let mut html = String::with_capacity(1024);
    // Writing into a String cannot fail
    let _ = write!(
        html,
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; background: #f8f9fa; padding: 20px; border-radius: 10px;">
  <div style="text-align: center; margin-bottom: 20px;">
    <h2 style="color: #6A5ACD; margin: 0;">СУДУ</h2>
    <p style="color: #666; margin: 5px 0;">{tagline}</p>
  </div>
  <div style="background: white; padding: 25px; border-radius: 8px; border: 1px solid #e0e0e0;">
    <h3 style="color: #333; margin-bottom: 15px;">{heading}</h3>
    <p style="color: #666; line-height: 1.5; margin-bottom: 20px;">{lead}</p>
    <div style="text-align: center; margin: 25px 0;">
      <a href="{link}" style="display: inline-block; padding: 12px 30px; background: #6A5ACD; color: white; text-decoration: none; border-radius: 25px; font-weight: bold;">{button}</a>
    </div>
    <p style="color: #999; font-size: 12px; text-align: center;">{footnote}</p>
    <p style="color: #999; font-size: 12px; text-align: center; word-break: break-all;">{link}</p>
  </div>
</div>"#
    );
    html
}

/// Escape text for HTML bodies and Telegram's HTML parse mode
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
