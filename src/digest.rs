//! The digest handed to subscribers after a run.
//!
//! Rendered as an HTML mail body with a plain-text alternative. An empty run
//! still produces a digest that says nothing new was found.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

use crate::models::Article;
use crate::utils::escape_html;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Digest {
    pub date: NaiveDate,
    pub articles: Vec<Article>,
}

const STYLE: &str = r#"
    body { font-family: Arial, sans-serif; line-height: 1.6; color: #333; }
    .header { background-color: #2c3e50; color: white; padding: 20px; text-align: center; }
    .article { border: 1px solid #ddd; margin: 20px 0; padding: 15px; border-radius: 5px; }
    .article h3 { color: #2c3e50; margin-top: 0; }
    .source { background-color: #3498db; color: white; padding: 5px 10px; border-radius: 3px; font-size: 12px; }
    .date { color: #7f8c8d; font-size: 14px; }
    .description { margin: 10px 0; }
    .read-more { background-color: #e74c3c; color: white; padding: 8px 15px; text-decoration: none; border-radius: 3px; }
"#;

impl Digest {
    pub fn new(date: NaiveDate, articles: Vec<Article>) -> Self {
        Self { date, articles }
    }

    /// `"October 18, 2026"`
    pub fn long_date(&self) -> String {
        self.date.format("%B %d, %Y").to_string()
    }

    pub fn subject(&self) -> String {
        format!(
            "🚀 African Startup Digest - {} ({} launches)",
            self.long_date(),
            self.articles.len()
        )
    }

    pub fn to_html(&self) -> String {
        let mut html = String::new();
        let date = self.long_date();

        if self.articles.is_empty() {
            let _ = write!(
                html,
                "<html>\n<body>\n<h2>🚀 African Startup Daily Digest</h2>\n\
                 <p><strong>Date:</strong> {date}</p>\n\
                 <p>No new startup launches found today. Check back tomorrow!</p>\n\
                 </body>\n</html>\n"
            );
            return html;
        }

        let _ = write!(
            html,
            "<html>\n<head>\n<style>{STYLE}</style>\n</head>\n<body>\n\
             <div class=\"header\">\n<h1>🚀 African Startup Daily Digest</h1>\n\
             <p><strong>Date:</strong> {date}</p>\n\
             <p>Latest Product &amp; Service Launches from African Startups</p>\n</div>\n\
             <div style=\"padding: 20px;\">\n\
             <p><strong>Found {} new startup launches today!</strong></p>\n",
            self.articles.len()
        );

        for article in &self.articles {
            let _ = write!(
                html,
                "<div class=\"article\">\n<h3>{}</h3>\n\
                 <p><span class=\"source\">{}</span> <span class=\"date\">{}</span></p>\n\
                 <div class=\"description\">{}</div>\n\
                 <a href=\"{}\" class=\"read-more\" target=\"_blank\">Read Full Story</a>\n</div>\n",
                escape_html(&article.title),
                escape_html(&article.source),
                escape_html(&article.date),
                escape_html(&article.description),
                escape_html(&article.url),
            );
        }

        html.push_str(
            "</div>\n<div style=\"background-color: #ecf0f1; padding: 20px; text-align: center; margin-top: 40px;\">\n\
             <p><em>This digest is automatically generated. Stay updated with the latest African startup ecosystem!</em></p>\n\
             </div>\n</body>\n</html>\n",
        );
        html
    }

    pub fn to_text(&self) -> String {
        let mut text = format!("African Startup Daily Digest - {}\n\n", self.long_date());
        if self.articles.is_empty() {
            text.push_str("No new startup launches found today. Check back tomorrow!\n");
            return text;
        }
        let _ = writeln!(text, "Found {} new startup launches today!\n", self.articles.len());
        for article in &self.articles {
            let _ = writeln!(text, "* {}", article.title);
            let _ = writeln!(text, "  {} | {}", article.source, article.date);
            if !article.description.is_empty() {
                let _ = writeln!(text, "  {}", article.description);
            }
            let _ = writeln!(text, "  {}\n", article.url);
        }
        text
    }
}
