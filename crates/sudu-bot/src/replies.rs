//! Reply texts. Messages are sent with Telegram's HTML parse mode, so
//! every interpolated value is escaped.

use chrono::{DateTime, Utc};

use sudu_notify::templates::escape_html;
use sudu_service::ServiceError;

pub fn start() -> String {
    "🔐 <b>Бот восстановления пароля СУДУ</b>\n\n\
     Для привязки аккаунта введите:\n\
     /link КОД_ИЗ_САЙТА\n\n\
     Для восстановления пароля:\n\
     1. На сайте нажмите \"Забыли пароль?\"\n\
     2. Введите ваш email\n\
     3. Код автоматически придет сюда\n\n\
     Для помощи:\n\
     /help"
        .to_string()
}

pub fn help() -> String {
    "📖 <b>Доступные команды:</b>\n\n\
     /start - начать работу с ботом\n\
     /link КОД - привязать аккаунт\n\
     /status - проверить статус системы\n\
     /help - показать эту справку\n\n\
     💡 Для восстановления пароля:\n\
     1. На сайте нажмите \"Забыли пароль?\"\n\
     2. Введите ваш email\n\
     3. Код автоматически придет в этот чат"
        .to_string()
}

pub fn link_usage() -> String {
    "Укажите код из сайта: /link КОД".to_string()
}

pub fn already_linked(name: &str, email: &str) -> String {
    format!(
        "ℹ️ Telegram уже привязан к этому аккаунту\n📧 {}\n👤 {}",
        escape_html(email),
        escape_html(name)
    )
}

/// Rejections are shown as they are; server faults are not
pub fn link_failed(err: &ServiceError) -> String {
    if err.status_code() < 500 {
        format!("❌ {}", escape_html(&err.to_string()))
    } else {
        "❌ Ошибка сервера, попробуйте позже".to_string()
    }
}

pub fn status(store_reachable: bool, linked_email: Option<&str>, now: DateTime<Utc>) -> String {
    let (db, summary) = if store_reachable {
        ("✅ Доступна", "✅ Все системы работают")
    } else {
        ("❌ Недоступна", "⚠️ Проблемы с подключением к базе данных")
    };
    let account = match linked_email {
        Some(email) => escape_html(email),
        None if store_reachable => "не привязан".to_string(),
        None => "неизвестно".to_string(),
    };
    format!(
        "📊 <b>Статус системы:</b>\n\n\
         🤖 Бот: ✅ Работает\n\
         🗄 База данных: {db}\n\
         🔗 Аккаунт: {account}\n\
         ⏰ Время: {} UTC\n\n\
         {summary}",
        now.format("%H:%M:%S")
    )
}

pub fn text_hint() -> String {
    "Используйте /help для списка команд".to_string()
}

pub fn unknown_command(name: &str) -> String {
    format!(
        "Неизвестная команда /{}. Используйте /help для списка команд",
        escape_html(name)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use sudu_core::{DomainError, NotificationError};

    #[test]
    fn test_link_failed_shows_rejection() {
        let err = ServiceError::from(DomainError::InvalidOrExpiredCode);
        assert_eq!(link_failed(&err), "❌ Неверный или просроченный код");
    }

    #[test]
    fn test_link_failed_hides_server_fault() {
        let err = ServiceError::from(DomainError::DatabaseError("pool timed out".to_string()));
        assert!(!link_failed(&err).contains("pool"));

        let err = ServiceError::from(DomainError::TransportFailure(NotificationError::Telegram(
            "x".to_string(),
        )));
        assert!(link_failed(&err).contains("Ошибка сервера"));
    }

    #[test]
    fn test_already_linked_escapes() {
        let text = already_linked("<Anna>", "a@x.io");
        assert!(text.contains("&lt;Anna&gt;"));
    }

    #[test]
    fn test_status_reports_store() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 15).unwrap();
        assert!(status(true, None, now).contains("✅ Доступна"));
        assert!(status(true, None, now).contains("Аккаунт: не привязан"));
        assert!(status(true, Some("a<b>@x.io"), now).contains("a&lt;b&gt;@x.io"));
        assert!(status(false, None, now).contains("❌ Недоступна"));
        assert!(status(true, None, now).contains("09:30:15 UTC"));
    }
}
