use std::sync::LazyLock;

use scraper::{Html, Selector};

use crate::{
    error::{Error, Result},
    html::ElementRefExt as _,
    model::SemesterInfo,
};

const VIEW: &str = "semesters";
const NAME_SUFFIX: &str = "- AMR";

static SEMESTER_SELECT_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"select[name="semesterSubId"]"#).unwrap());

static OPTION_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("option").unwrap());

#[tracing::instrument(level = tracing::Level::DEBUG, name = "parse_semesters", skip(document))]
pub fn parse(document: &Html) -> Result<Vec<SemesterInfo>> {
    let select = document
        .select(&SEMESTER_SELECT_SELECTOR)
        .next()
        .ok_or_else(|| Error::parse(VIEW, "semester dropdown not found"))?;
    let mut semesters: Vec<SemesterInfo> = Vec::new();
    for option in select.select(&OPTION_SELECTOR) {
        let id = option.attr("value").unwrap_or_default().trim();
        let name = option.to_string(" ");
        if id.is_empty() || name.is_empty() || name.contains("Select") {
            continue;
        }
        if semesters.iter().any(|s| s.id == id) {
            tracing::debug!("duplicate semester option {id}");
            continue;
        }
        semesters.push(SemesterInfo {
            id: id.to_string(),
            name: name.replace(NAME_SUFFIX, "").trim().to_string(),
        });
    }
    Ok(semesters)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <form>
          <select name="semesterSubId" class="form-control">
            <option value="">-- Select Semester --</option>
            <option value="AP2024254">Fall Semester 2024-25 - AMR</option>
            <option value="AP2023242">Winter Semester 2023-24</option>
            <option value="   ">Empty</option>
            <option value="AP2023242">Winter Semester 2023-24</option>
          </select>
        </form>"#;

    #[test]
    fn skips_placeholder_and_strips_suffix() {
        let semesters = parse(&Html::parse_document(PAGE)).unwrap();
        assert_eq!(
            semesters,
            vec![
                SemesterInfo {
                    id: "AP2024254".to_string(),
                    name: "Fall Semester 2024-25".to_string(),
                },
                SemesterInfo {
                    id: "AP2023242".to_string(),
                    name: "Winter Semester 2023-24".to_string(),
                },
            ]
        );
    }

    #[test]
    fn missing_dropdown_is_parse_error() {
        let err = parse(&Html::parse_document("<p>maintenance</p>")).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Parse);
    }

    #[test]
    fn dropdown_without_semesters_is_empty() {
        let page = r#"<select name="semesterSubId"><option value="">Select</option></select>"#;
        assert!(parse(&Html::parse_document(page)).unwrap().is_empty());
    }
}
