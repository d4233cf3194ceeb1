use contracts::domain::a003_service_batch::BatchManifest;

use crate::shared::format::format_date;

const MANIFEST_STYLE: &str = r#"
    body { font-family: Arial, sans-serif; margin: 20px; }
    .header { text-align: center; margin-bottom: 30px; }
    .info { margin-bottom: 20px; }
    table { width: 100%; border-collapse: collapse; }
    th, td { border: 1px solid #000; padding: 8px; text-align: left; }
    th { background-color: #f0f0f0; }
    .signature { margin-top: 50px; }
"#;

fn escape(text: &str) -> String {
    ammonia::clean_text(text)
}

/// HTML-ведомость отправки картриджей в сервис
///
/// Все введенные пользователем строки экранируются через ammonia,
/// пробелы в них выводятся как `&#32;`.
pub fn render_html(manifest: &BatchManifest) -> String {
    let number = escape(&manifest.batch_number);
    let date = format_date(manifest.date);
    let responsible = escape(&manifest.responsible);

    let mut rows = String::new();
    for row in &manifest.rows {
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            row.index,
            escape(&row.number),
            escape(&row.model),
            row.prior_status_label
        ));
    }

    let notes = manifest
        .notes
        .as_deref()
        .map(|n| format!("<div><strong>Примечания:</strong> {}</div>", escape(n)))
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Ведомость отправки {number}</title>
<style>{MANIFEST_STYLE}</style>
</head>
<body>
<div class="header">
<h1>ВЕДОМОСТЬ ОТПРАВКИ КАРТРИДЖЕЙ В СЕРВИС</h1>
<h2>№ {number}</h2>
</div>
<div class="info">
<div><strong>Дата:</strong> {date}</div>
<div><strong>Ответственный:</strong> {responsible}</div>
<div><strong>Количество картриджей:</strong> {total} шт.</div>
{notes}
</div>
<table>
<thead><tr><th>№</th><th>Номер картриджа</th><th>Модель</th><th>Предыдущий статус</th></tr></thead>
<tbody>{rows}</tbody>
</table>
<div class="signature">
<p>Ответственный за отправку: _________________ {responsible}</p>
<p>Дата: {date}</p>
</div>
</body>
</html>
"#,
        total = manifest.total,
    )
}
