use folio_common::Document;
use serde_json::json;

/// Placeholder document written by `folio` on first setup. Every section the
/// dashboard edits is present, shaped the way the public page reads it.
pub fn default_document() -> Document {
    let value = json!({
        "settings": {
            "site_title": "Portfolio",
            "nav_logo": "portfolio.dev",
            "meta_description": "A personal portfolio.",
            "footer": "© Portfolio"
        },
        "hero": {
            "tag": "Hey there, I'm",
            "name_line1": "Your",
            "name_line2": "Name",
            "typing_phrases": ["Developer", "Builder"],
            "subtitle": "A short line about what you do.",
            "cta_primary_text": "See My Work",
            "cta_primary_link": "#projects",
            "cta_secondary_text": "Get in Touch",
            "cta_secondary_link": "#contact"
        },
        "about": {
            "paragraphs": ["Tell visitors who you are."],
            "facts": [
                {"emoji": "📍", "label": "Based in", "value": "Somewhere"}
            ]
        },
        "timeline": {
            "items": [
                {
                    "year": "THE BEGINNING",
                    "title": "First steps",
                    "description": "Where it all started.",
                    "badge": ""
                }
            ]
        },
        "skills": {
            "items": [
                {"emoji": "🦀", "name": "Rust"}
            ]
        },
        "github": {
            "username": "",
            "show_stats": false
        },
        "nowplaying": {
            "track": "",
            "artist": "",
            "note": ""
        },
        "projects": {
            "items": [
                {
                    "emoji": "🚀",
                    "title": "First project",
                    "description": "What it does and why it matters.",
                    "tags": ["Rust"],
                    "links": [
                        {"label": "GitHub Repo →", "url": "https://github.com/"}
                    ],
                    "featured": true
                }
            ]
        },
        "contact": {
            "tagline": "Want to collaborate? Say hello.",
            "email": "you@example.com",
            "socials": [
                {"platform": "github", "label": "GitHub", "url": "https://github.com/"}
            ]
        }
    });

    match Document::from_value(value) {
        Ok(document) => document,
        Err(_) => unreachable!("default document literal is an object"),
    }
}
