//! Tableau des features filtrées

use serde::Serialize;

use super::escape_html;
use crate::schema::Record;

/// Une ligne du tableau
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub id: String,
    pub name: String,
    pub country: Option<String>,
    pub continent: Option<String>,
    /// Couleur du badge continent
    pub color: Option<String>,
    pub attendance: Option<String>,
    pub size: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl TableRow {
    pub fn from_record(record: &Record) -> Self {
        let props = &record.props;
        Self {
            id: record.id.clone(),
            name: props.name.clone(),
            country: props.country.clone(),
            continent: props.continent.clone(),
            color: props.color.clone(),
            attendance: props
                .attendance_label
                .clone()
                .or_else(|| props.attendance.map(|a| format!("{}", a.round() as i64))),
            size: props.size.clone(),
            lat: record.position.map(|p| p.lat),
            lng: record.position.map(|p| p.lng),
        }
    }

    /// Balisage `<tr>` (valeurs échappées, actions en `data-*`)
    pub fn to_html(&self) -> String {
        let cell = |value: &Option<String>| escape_html(value.as_deref().unwrap_or(""));

        let mut html = String::with_capacity(512);
        html.push_str("<tr>");
        html.push_str(&format!("<td><strong>{}</strong></td>", escape_html(&self.name)));
        html.push_str(&format!("<td>{}</td>", cell(&self.country)));
        html.push_str(&format!(
            r#"<td><span class="continent-badge" style="background: {}">{}</span></td>"#,
            cell(&self.color),
            cell(&self.continent)
        ));
        html.push_str(&format!("<td>{}</td>", cell(&self.attendance)));
        html.push_str(&format!("<td>{}</td>", cell(&self.size)));

        html.push_str("<td>");
        if let (Some(lat), Some(lng)) = (self.lat, self.lng) {
            html.push_str(&format!(
                r#"<button class="table-action" data-action="zoom-to" data-lat="{}" data-lng="{}"><i class="fas fa-map-marker-alt"></i></button>"#,
                lat, lng
            ));
        }
        html.push_str(&format!(
            r#"<button class="table-action" data-action="show-details" data-feature-id="{}"><i class="fas fa-info-circle"></i></button>"#,
            escape_html(&self.id)
        ));
        html.push_str("</td></tr>");
        html
    }
}

pub fn rows(records: &[&Record]) -> Vec<TableRow> {
    records.iter().map(|r| TableRow::from_record(r)).collect()
}

/// Corps complet du tableau
pub fn rows_html(rows: &[TableRow]) -> String {
    rows.iter().map(TableRow::to_html).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geojson::Feature;
    use serde_json::json;

    fn record() -> Record {
        let feature: Feature = serde_json::from_value(json!({
            "type": "Feature",
            "properties": {
                "name": "Ozora & Friends", "country": "Hungria", "continent": "Europa",
                "attendance_numeric": 60000, "color": "#2E7D32"
            },
            "geometry": { "type": "Point", "coordinates": [18.1, 46.8] }
        }))
        .unwrap();
        Record::from_feature(feature, 0)
    }

    #[test]
    fn test_row_from_record() {
        let row = TableRow::from_record(&record());
        assert_eq!(row.name, "Ozora & Friends");
        assert_eq!(row.attendance.as_deref(), Some("60000"));
        assert_eq!(row.size.as_deref(), Some("Grande (20k+)"));
        assert_eq!((row.lat, row.lng), (Some(46.8), Some(18.1)));
    }

    #[test]
    fn test_rows_html() {
        let r = record();
        let html = rows_html(&rows(&[&r]));
        assert!(html.starts_with("<tr>"));
        assert!(html.contains("Ozora &amp; Friends"));
        assert!(html.contains(r#"data-action="zoom-to" data-lat="46.8" data-lng="18.1""#));
        assert!(html.contains(r#"data-action="show-details""#));
        assert!(html.ends_with("</tr>"));
    }
}
