//! Language-keyed UI text.
//!
//! Lookup order is `table[lang][key]`, then `table["en"][key]`, then the key
//! itself.

pub const DEFAULT_LANGUAGE: &str = "en";
pub const LANGUAGES: &[&str] = &["en", "ru"];

const EN: &[(&str, &str)] = &[
    ("ui.title", "Browser agent"),
    ("ui.prompt.placeholder", "Describe the task for the agent"),
    ("ui.start", "Start"),
    ("ui.start.tooltip", "Send the task to the agent"),
    ("ui.confirm", "Continue"),
    ("ui.confirm.tooltip", "Approve the pending action and continue"),
    ("ui.stop", "Stop"),
    ("ui.stop.tooltip", "Stop the running task"),
    ("ui.reply.placeholder", "Type your answer for the agent"),
    ("ui.status", "Status"),
    ("ui.log", "Activity"),
    ("ui.language", "Language"),
    ("ui.language.tooltip", "Switch interface language"),
    ("status.idle", "Idle"),
    ("status.starting", "Starting"),
    ("status.queued", "Queued"),
    ("status.running", "Running"),
    ("status.waiting_confirm", "Waiting for confirmation"),
    ("status.waiting_user", "Waiting for your reply"),
    ("status.done", "Done"),
    ("status.stopped", "Stopped"),
    ("status.error", "Error"),
    ("status.continuing", "Continuing"),
    ("status.stopping", "Stopping"),
    ("action.navigate", "Navigating"),
    ("action.snapshot", "Reading page"),
    ("action.click", "Clicking"),
    ("action.type", "Typing"),
    ("action.scroll", "Scrolling"),
    ("action.wait", "Waiting"),
    ("action.wait_for_network_idle", "Waiting for network"),
    ("action.back", "Going back"),
    ("action.forward", "Going forward"),
    ("action.extract", "Extracting"),
    ("action.ask_user", "Asking user"),
    ("action.finish", "Finishing"),
    ("action.take_screenshot", "Taking screenshot"),
    ("action.save_trace", "Saving trace"),
    ("action.stop_task", "Stopping task"),
    ("action.direct_answer", "Answering directly"),
    ("action.none", "No action"),
    ("action.unknown", "Action"),
    ("log.task_started", "Task started"),
    ("log.start_failed", "Failed to start task"),
    ("log.needs_confirmation", "Confirmation required"),
    ("log.needs_user_input", "The agent asks"),
    ("log.error", "Error"),
    ("log.stream_error", "Event stream error"),
    ("log.reply_required", "Type a reply before continuing"),
    ("log.confirm_failed", "Continue request failed"),
    ("log.stop_failed", "Stop request failed"),
    ("alert.empty_prompt", "Please describe the task first."),
    ("alert.missing_reply", "A reply is required to continue."),
    ("alert.missing_api_key", "Enter an API key to load models."),
    ("models.loading", "Loading models..."),
    ("models.none", "No models available for this key."),
];

const RU: &[(&str, &str)] = &[
    ("ui.title", "Браузерный агент"),
    ("ui.prompt.placeholder", "Опишите задачу для агента"),
    ("ui.start", "Запустить"),
    ("ui.start.tooltip", "Отправить задачу агенту"),
    ("ui.confirm", "Продолжить"),
    ("ui.confirm.tooltip", "Подтвердить действие и продолжить"),
    ("ui.stop", "Остановить"),
    ("ui.stop.tooltip", "Остановить выполнение задачи"),
    ("ui.reply.placeholder", "Введите ответ для агента"),
    ("ui.status", "Статус"),
    ("ui.log", "Журнал"),
    ("ui.language", "Язык"),
    ("ui.language.tooltip", "Сменить язык интерфейса"),
    ("status.idle", "Ожидание"),
    ("status.starting", "Запуск"),
    ("status.queued", "В очереди"),
    ("status.running", "Выполняется"),
    ("status.waiting_confirm", "Ждёт подтверждения"),
    ("status.waiting_user", "Ждёт вашего ответа"),
    ("status.done", "Готово"),
    ("status.stopped", "Остановлено"),
    ("status.error", "Ошибка"),
    ("status.continuing", "Продолжаем"),
    ("status.stopping", "Останавливаем"),
    ("action.navigate", "Переход"),
    ("action.snapshot", "Чтение страницы"),
    ("action.click", "Клик"),
    ("action.type", "Ввод текста"),
    ("action.scroll", "Прокрутка"),
    ("action.wait", "Ожидание"),
    ("action.wait_for_network_idle", "Ожидание сети"),
    ("action.back", "Назад"),
    ("action.forward", "Вперёд"),
    ("action.extract", "Извлечение"),
    ("action.ask_user", "Вопрос пользователю"),
    ("action.finish", "Завершение"),
    ("action.take_screenshot", "Снимок экрана"),
    ("action.save_trace", "Сохранение трассы"),
    ("action.stop_task", "Остановка задачи"),
    ("action.direct_answer", "Прямой ответ"),
    ("action.none", "Нет действия"),
    ("action.unknown", "Действие"),
    ("log.task_started", "Задача запущена"),
    ("log.start_failed", "Не удалось запустить задачу"),
    ("log.needs_confirmation", "Требуется подтверждение"),
    ("log.needs_user_input", "Агент спрашивает"),
    ("log.error", "Ошибка"),
    ("log.stream_error", "Ошибка потока событий"),
    ("log.reply_required", "Введите ответ, чтобы продолжить"),
    ("log.confirm_failed", "Не удалось отправить подтверждение"),
    ("log.stop_failed", "Не удалось отправить остановку"),
    ("alert.empty_prompt", "Сначала опишите задачу."),
    ("alert.missing_reply", "Для продолжения нужен ответ."),
    ("alert.missing_api_key", "Введите API-ключ, чтобы загрузить модели."),
    ("models.loading", "Загрузка моделей..."),
    ("models.none", "Для этого ключа нет доступных моделей."),
];

fn table(lang: &str) -> Option<&'static [(&'static str, &'static str)]> {
    match lang {
        "en" => Some(EN),
        "ru" => Some(RU),
        _ => None,
    }
}

fn find(lang: &str, key: &str) -> Option<&'static str> {
    table(lang)?
        .iter()
        .find(|(candidate, _)| *candidate == key)
        .map(|(_, text)| *text)
}

/// Text for `key` in `lang`, or in English, if either table has it.
pub fn lookup(lang: &str, key: &str) -> Option<&'static str> {
    find(lang, key).or_else(|| find(DEFAULT_LANGUAGE, key))
}

/// Text for `key` in `lang`, falling back to English and finally to the key.
pub fn resolve<'a>(lang: &str, key: &'a str) -> &'a str {
    lookup(lang, key).unwrap_or(key)
}

/// Localized label for a backend tool name.
pub fn action_label(lang: &str, tool: &str) -> &'static str {
    let key = format!("action.{tool}");
    lookup(lang, &key)
        .or_else(|| lookup(lang, "action.unknown"))
        .unwrap_or("Action")
}

/// Localized label for a status token, or the token itself when unknown.
pub fn status_label<'a>(lang: &str, status: &'a str) -> &'a str {
    lookup(lang, &format!("status.{status}")).unwrap_or(status)
}

pub fn is_supported(lang: &str) -> bool {
    LANGUAGES.contains(&lang)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_english_then_key() {
        assert_eq!(resolve("ru", "ui.start"), "Запустить");
        assert_eq!(resolve("de", "ui.start"), "Start");
        assert_eq!(resolve("ru", "ui.no_such_key"), "ui.no_such_key");
    }

    #[test]
    fn every_russian_key_exists_in_english() {
        for (key, _) in RU {
            assert!(find("en", key).is_some(), "{key} missing from en");
        }
        for (key, _) in EN {
            assert!(find("ru", key).is_some(), "{key} missing from ru");
        }
    }

    #[test]
    fn unknown_tool_uses_generic_label() {
        assert_eq!(action_label("en", "navigate"), "Navigating");
        assert_eq!(action_label("en", "teleport"), "Action");
        assert_eq!(action_label("ru", "teleport"), "Действие");
    }

    #[test]
    fn unknown_status_token_is_shown_verbatim() {
        assert_eq!(status_label("en", "waiting_confirm"), "Waiting for confirmation");
        assert_eq!(status_label("en", "paused"), "paused");
    }
}
