use proptest::prelude::*;
use serde_json::json;
use sheet_lookup::response::{read_file, SearchResponse};
use sheet_lookup::{parse, parse_declared, parse_delimited_text, resolve, FileKind, LookupResult, NormalizationPolicy, Value};

const PEOPLE: &str = "name,ID,city\nAlice,A-1,Paris\n\nBob,b-2,Oslo\n  Carol , C-3 ,\"Rome\"\n";

#[test]
fn csv_end_to_end() {
    let sheets = parse_declared(PEOPLE.as_bytes(), "csv", &NormalizationPolicy::search()).unwrap();
    assert_eq!(sheets.len(), 1);
    assert_eq!(sheets[0].name, "Sheet1");

    let response = SearchResponse::from_result(resolve(&sheets, " B-2 "), " B-2 ");
    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        json!({
            "success": true,
            "data": { "name": "Bob", "ID": "b-2", "city": "Oslo" },
            "multipleSheets": false,
            "sheets": [{
                "sheetName": "Sheet1",
                "data": { "name": "Bob", "ID": "b-2", "city": "Oslo" },
                "searchedColumn": "ID"
            }],
            "searchedValue": " B-2 "
        })
    );

    // trimmed cells and stripped quotes
    match resolve(&sheets, "c-3") {
        LookupResult::Found(found) => {
            assert_eq!(found.data.get("name"), Some(&Value::from("Carol")));
            assert_eq!(found.data.get("city"), Some(&Value::from("Rome")));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn csv_not_found_response() {
    let sheets = parse(PEOPLE.as_bytes(), FileKind::Csv, &NormalizationPolicy::search()).unwrap();
    let response = SearchResponse::from_result(resolve(&sheets, "Z-9"), "Z-9");
    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        json!({
            "success": false,
            "error": "No data found for ID: Z-9",
            "searchedValue": "Z-9"
        })
    );
}

#[test]
fn first_column_is_the_key_without_id_header() {
    let sheet = parse_delimited_text("code,label\nx1,first\nx2,second\n", &NormalizationPolicy::search()).unwrap();
    let result = resolve(&[sheet], "X2");
    assert_eq!(result.matches()[0].searched_column, "code");
    assert_eq!(result.matches()[0].data.get("label"), Some(&Value::from("second")));
}

#[test]
fn display_view_of_csv() {
    let contents = read_file(
        "people.csv",
        b"id,,name\n1,x,Alice\n,,\n2,,Bob\n",
        FileKind::Csv,
        &NormalizationPolicy::display(),
    )
    .unwrap();
    let view = contents.data.unwrap();
    assert_eq!(view.columns, ["id", "name"]);
    assert_eq!(view.total_rows, 2);
    assert_eq!(view.to_csv(), "id,name\n1,Alice\n2,Bob");
}

#[test]
fn empty_csv_is_an_error() {
    let error = parse_declared(b"\n  \n", "csv", &NormalizationPolicy::search()).unwrap_err();
    assert_eq!(error.to_string(), "No data found in file");
}

#[test]
fn url_import_keeps_quoted_commas() {
    let text = "id,address\n1,\"12 Main St, Springfield\"\n";
    let sheet = parse_delimited_text(text, &NormalizationPolicy::url_import()).unwrap();
    assert_eq!(sheet.rows[0].get("address"), Some(&Value::from("12 Main St, Springfield")));
}

fn identifier() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,7}"
}

proptest! {
    #[test]
    fn every_data_line_becomes_a_row(ids in prop::collection::vec(identifier(), 1..40)) {
        let mut text = String::from("id,value\n");
        for (index, id) in ids.iter().enumerate() {
            text.push_str(&format!("{id},{index}\n"));
        }
        let sheet = parse_delimited_text(&text, &NormalizationPolicy::search()).unwrap();
        prop_assert_eq!(sheet.rows.len(), ids.len());
        for (row, id) in sheet.rows.iter().zip(&ids) {
            let expected = Value::from(id.as_str());
            prop_assert_eq!(row.get("id"), Some(&expected));
        }
    }

    #[test]
    fn lookup_finds_first_row_with_id(ids in prop::collection::vec(identifier(), 1..40), pick in any::<prop::sample::Index>()) {
        let mut text = String::from("id,position\n");
        for (index, id) in ids.iter().enumerate() {
            text.push_str(&format!("{id},{index}\n"));
        }
        let sheet = parse_delimited_text(&text, &NormalizationPolicy::search()).unwrap();
        let wanted = pick.get(&ids);
        let first = ids.iter().position(|id| id == wanted).unwrap();

        let upper = wanted.to_uppercase();
        match resolve(&[sheet], &upper) {
            LookupResult::Found(found) => {
                let expected = Value::from(first.to_string());
                prop_assert_eq!(found.data.get("position"), Some(&expected));
            }
            other => prop_assert!(false, "unexpected {:?}", other),
        }
    }

    #[test]
    fn each_matching_sheet_contributes_one_match(count in 1usize..6, hit in prop::collection::vec(any::<bool>(), 6)) {
        let mut sheets = Vec::new();
        for index in 0..count {
            let id = if hit[index] { "target" } else { "other" };
            let text = format!("id,n\n{id},{index}\n{id},late\n");
            sheets.push(parse_delimited_text(&text, &NormalizationPolicy::search()).unwrap());
        }
        let expected = hit[..count].iter().filter(|flag| **flag).count();
        let result = resolve(&sheets, "TARGET");
        prop_assert_eq!(result.matches().len(), expected);
        prop_assert_eq!(result.is_found(), expected > 0);
        if expected > 1 {
            prop_assert!(matches!(result, LookupResult::Multiple(_)));
        }
    }
}
