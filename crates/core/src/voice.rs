//! Call-control markup returned to the telephony provider.
//!
//! A [`VoicePrompt`] always renders in the same order: the gather block with
//! its prompts, then the trailing spoken segments, then the terminal
//! directive. The provider runs the verbs top to bottom, so anything after a
//! gather only executes when the caller enters nothing before the gather
//! times out.

use std::fmt::Write as _;

use serde::Serialize;

use crate::models::Route;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GatherDirective {
    pub num_digits: u8,
    pub action: Route,
    pub prompts: Vec<String>,
}

impl GatherDirective {
    pub fn new(num_digits: u8, action: Route, prompt: impl Into<String>) -> Self {
        Self {
            num_digits,
            action,
            prompts: vec![prompt.into()],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "route")]
pub enum Terminal {
    Hangup,
    Redirect(Route),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VoicePrompt {
    pub gather: Option<GatherDirective>,
    pub segments: Vec<String>,
    pub terminal: Option<Terminal>,
}

impl VoicePrompt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gather(mut self, directive: GatherDirective) -> Self {
        self.gather = Some(directive);
        self
    }

    pub fn say(mut self, text: impl Into<String>) -> Self {
        self.segments.push(text.into());
        self
    }

    pub fn hangup(mut self) -> Self {
        self.terminal = Some(Terminal::Hangup);
        self
    }

    pub fn redirect(mut self, route: Route) -> Self {
        self.terminal = Some(Terminal::Redirect(route));
        self
    }

    pub fn render(&self) -> VoiceDocument {
        let mut xml = String::from(r#"<?xml version="1.0" encoding="UTF-8"?><Response>"#);

        if let Some(gather) = &self.gather {
            let _ = write!(
                xml,
                r#"<Gather action="{}" method="POST" numDigits="{}">"#,
                escape_xml(gather.action.path()),
                gather.num_digits
            );
            for prompt in &gather.prompts {
                push_say(&mut xml, prompt);
            }
            xml.push_str("</Gather>");
        }

        for segment in &self.segments {
            push_say(&mut xml, segment);
        }

        match self.terminal {
            Some(Terminal::Hangup) => xml.push_str("<Hangup/>"),
            Some(Terminal::Redirect(route)) => {
                let _ = write!(
                    xml,
                    r#"<Redirect method="POST">{}</Redirect>"#,
                    escape_xml(route.path())
                );
            }
            None => {}
        }

        xml.push_str("</Response>");
        VoiceDocument(xml)
    }
}

/// Rendered XML document, ready to be sent as the response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceDocument(String);

impl VoiceDocument {
    pub const CONTENT_TYPE: &'static str = "application/xml";

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

fn push_say(xml: &mut String, text: &str) {
    xml.push_str("<Say>");
    xml.push_str(&escape_xml(text));
    xml.push_str("</Say>");
}

fn escape_xml(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}
