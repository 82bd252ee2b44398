//! MDX page rendering for talks and speakers

use crate::error::Result;
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera, Value};

const TALK_TEMPLATE: &str = r#"---
type: conference
title: "{{ title | quoted }}"
start: {{ start }}
end: {{ end }}
speakers:
{% for slug in speakers %}    - {{ slug }}
{% endfor %}room:
rows:
subtitled: false
feedback:
---

{{ summary }}"#;

const SPEAKER_TEMPLATE: &str = r#"---
name: {{ name }}
slug: {{ slug }}
image: {{ image }}
twitter: "{{ twitter | quoted }}"
github: "{{ github | quoted }}"
company: {{ company }}
---

{{ bio }}"#;

/// Front matter and body of one talk page
#[derive(Debug, Serialize)]
pub struct TalkPage<'a> {
    pub title: &'a str,
    pub start: &'a str,
    pub end: &'a str,
    pub speakers: Vec<&'a str>,
    pub summary: &'a str,
}

/// Front matter and body of one speaker page
#[derive(Debug, Serialize)]
pub struct SpeakerPage<'a> {
    pub name: &'a str,
    pub slug: &'a str,
    pub image: &'a str,
    pub twitter: &'a str,
    pub github: &'a str,
    pub company: &'a str,
    pub bio: &'a str,
}

/// Escape `\` and `"` for use inside a double-quoted YAML scalar.
fn quoted(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let text = tera::try_get_value!("quoted", "value", String, value);
    Ok(Value::String(text.replace('\\', "\\\\").replace('"', "\\\"")))
}

pub struct PageRenderer {
    tera: Tera,
}

impl PageRenderer {
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        tera.register_filter("quoted", quoted);
        tera.add_raw_templates(vec![
            ("talk.mdx", TALK_TEMPLATE),
            ("speaker.mdx", SPEAKER_TEMPLATE),
        ])?;
        Ok(Self { tera })
    }

    pub fn render_talk(&self, page: &TalkPage<'_>) -> Result<String> {
        let context = Context::from_serialize(page)?;
        Ok(self.tera.render("talk.mdx", &context)?)
    }

    pub fn render_speaker(&self, page: &SpeakerPage<'_>) -> Result<String> {
        let context = Context::from_serialize(page)?;
        Ok(self.tera.render("speaker.mdx", &context)?)
    }
}
