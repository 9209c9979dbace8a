use std::fmt::Write;

use crate::models::report::{ConsolidatedReport, Month};

pub fn csv_filename(month: &str) -> String {
    format!("relatorio_{}.csv", month)
}

/// Serializes the report as UTF-8 CSV: header row = column union, missing
/// cells written empty. An empty report yields an empty body.
pub fn to_csv(report: &ConsolidatedReport) -> Result<Vec<u8>, csv::Error> {
    let columns = report.columns();
    if columns.is_empty() {
        return Ok(Vec::new());
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&columns)?;
    for row in report.rows() {
        writer.write_record(
            columns
                .iter()
                .map(|c| row.get(*c).map(String::as_str).unwrap_or("")),
        )?;
    }
    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
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

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"pt-BR\">\n<head><meta charset=\"utf-8\"><title>{}</title></head>\n<body>\n{}</body>\n</html>\n",
        escape(title),
        body
    )
}

fn month_form(selected: Option<&str>) -> String {
    let mut form = String::from(concat!(
        "<form action=\"/report\" method=\"get\">\n",
        "<label for=\"month\">Mês Referência</label>\n",
        "<select id=\"month\" name=\"month\">\n",
    ));
    for month in Month::ALL {
        let marker = if selected == Some(month.as_str()) { " selected" } else { "" };
        let _ = writeln!(form, "<option value=\"{0}\"{1}>{0}</option>", month, marker);
    }
    form.push_str("</select>\n<button type=\"submit\">Gerar Relatório</button>\n</form>\n");
    form
}

/// Landing page with the month selector.
pub fn render_index() -> String {
    let body = format!(
        "<h1>Sistema de Gestão de Professores</h1>\n{}",
        month_form(None)
    );
    page("Sistema Escolar", &body)
}

/// Report page: the consolidated table, or the empty-report warning, plus the
/// list of teachers whose spreadsheet could not be read.
pub fn render_report(report: &ConsolidatedReport) -> String {
    let mut body = String::new();
    let _ = writeln!(body, "<h1>Sistema de Gestão de Professores</h1>");
    body.push_str(&month_form(Some(&report.month)));

    if let Some(document) = &report.roster_document {
        let _ = writeln!(
            body,
            "<p class=\"success\">Conexão com {} realizada com sucesso!</p>",
            escape(document)
        );
    }
    let _ = writeln!(
        body,
        "<p>Buscando atividades de {} professores para o mês de {}.</p>",
        report.roster_size(),
        escape(&report.month)
    );

    if report.is_empty() {
        let _ = writeln!(
            body,
            "<p class=\"warning\">Nenhum dado encontrado ou erro ao ler as abas de '{}'. Verifique se o nome da aba nas planilhas dos professores está exatamente igual.</p>",
            escape(&report.month)
        );
    } else {
        let columns = report.columns();
        let _ = writeln!(body, "<h2>Relatório Consolidado</h2>");
        let _ = writeln!(
            body,
            "<p>{} linha(s), gerado em {}</p>",
            report.rows().len(),
            report.generated_at.format("%d/%m/%Y %H:%M")
        );
        body.push_str("<table>\n<thead><tr>");
        for column in &columns {
            let _ = write!(body, "<th>{}</th>", escape(column));
        }
        body.push_str("</tr></thead>\n<tbody>\n");
        for row in report.rows() {
            body.push_str("<tr>");
            for column in &columns {
                let cell = row.get(*column).map(String::as_str).unwrap_or("");
                let _ = write!(body, "<td>{}</td>", escape(cell));
            }
            body.push_str("</tr>\n");
        }
        body.push_str("</tbody>\n</table>\n");
        let _ = writeln!(
            body,
            "<p><a href=\"/report.csv?month={}\" download=\"{}\">Baixar CSV</a></p>",
            escape(&report.month),
            escape(&csv_filename(&report.month))
        );
    }

    let failures: Vec<_> = report.failures().collect();
    if !failures.is_empty() {
        body.push_str("<h3>Planilhas não lidas</h3>\n<ul>\n");
        for (teacher, err) in failures {
            let _ = writeln!(body, "<li>{}: {}</li>", escape(teacher), escape(&err.to_string()));
        }
        body.push_str("</ul>\n");
    }

    page(&format!("Relatório {}", report.month), &body)
}

/// Error page for fatal failures, with a remediation hint.
pub fn render_error(message: &str, hint: &str) -> String {
    let body = format!(
        "<h1>Sistema de Gestão de Professores</h1>\n<p class=\"error\">Erro Geral: {}</p>\n<p class=\"hint\">Dica: {}</p>\n",
        escape(message),
        escape(hint)
    );
    page("Sistema Escolar", &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SheetsError;
    use crate::models::report::{EntryStatus, SheetRow};

    fn row(pairs: &[(&str, &str)]) -> SheetRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn sample() -> ConsolidatedReport {
        let mut report = ConsolidatedReport::new("MARCO");
        report.push_rows([
            row(&[("Atividade", "Aula, \"revisão\""), ("teacher", "Ana")]),
            row(&[("Turma", "6A"), ("teacher", "Bruno")]),
        ]);
        report
    }

    fn parse_csv(bytes: &[u8]) -> Vec<SheetRow> {
        let mut reader = csv::Reader::from_reader(bytes);
        let header: Vec<String> = reader
            .headers()
            .unwrap()
            .iter()
            .map(str::to_string)
            .collect();
        reader
            .records()
            .map(|rec| {
                let rec = rec.unwrap();
                header
                    .iter()
                    .cloned()
                    .zip(rec.iter().map(str::to_string))
                    .collect()
            })
            .collect()
    }

    #[test]
    fn csv_has_union_header_and_blank_cells() {
        let text = String::from_utf8(to_csv(&sample()).unwrap()).unwrap();
        let mut lines = text.lines();

        assert_eq!(lines.next(), Some("Atividade,teacher,Turma"));
        assert_eq!(lines.next(), Some("\"Aula, \"\"revisão\"\"\",Ana,"));
        assert_eq!(lines.next(), Some(",Bruno,6A"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn csv_round_trip_preserves_rows() {
        let report = sample();
        let parsed = parse_csv(&to_csv(&report).unwrap());

        assert_eq!(parsed.len(), 2);
        for (original, back) in report.rows().iter().zip(&parsed) {
            for (key, value) in back {
                let expected = original.get(key).map(String::as_str).unwrap_or("");
                assert_eq!(value, expected);
            }
            for (key, value) in original {
                assert_eq!(&back[key], value);
            }
        }
    }

    #[test]
    fn empty_report_has_empty_csv() {
        let report = ConsolidatedReport::new("JUNHO");
        assert!(to_csv(&report).unwrap().is_empty());
    }

    #[test]
    fn filename_includes_month() {
        assert_eq!(csv_filename("FEVEREIRO"), "relatorio_FEVEREIRO.csv");
    }

    #[test]
    fn report_page_escapes_cells() {
        let mut report = ConsolidatedReport::new("MAIO");
        report.push_rows([row(&[("Obs", "<b>&</b>"), ("teacher", "Ana")])]);

        let html = render_report(&report);

        assert!(html.contains("<td>&lt;b&gt;&amp;&lt;/b&gt;</td>"));
        assert!(html.contains("relatorio_MAIO.csv"));
        assert!(html.contains("<option value=\"MAIO\" selected>MAIO</option>"));
    }

    #[test]
    fn empty_report_page_warns_and_lists_failures() {
        let mut report = ConsolidatedReport::new("ABRIL");
        report.record("Ana", EntryStatus::Failed(SheetsError::PermissionDenied("urlA".into())));

        let html = render_report(&report);

        assert!(html.contains("Nenhum dado encontrado"));
        assert!(html.contains("<li>Ana: permission denied for urlA"));
        assert!(html.contains("Buscando atividades de 1 professores para o mês de ABRIL."));
        assert!(!html.contains("Conexão com"));
        assert!(!html.contains("<table>"));
    }

    #[test]
    fn index_offers_all_months() {
        let html = render_index();
        for month in Month::ALL {
            assert!(html.contains(&format!("<option value=\"{0}\">{0}</option>", month)));
        }
        assert!(html.contains("Gerar Relatório"));
    }
}
