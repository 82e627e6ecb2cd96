// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! HTML pages of the upload front end
//!
//! All request-derived text goes through `ammonia::clean_text` before it is
//! placed in the markup.

use ammonia::clean_text;

use crate::tts::TtsEngine;

const STYLE: &str = "body{font-family:sans-serif;max-width:40rem;margin:3rem auto;padding:0 1rem}\
.error{color:#a00;border:1px solid #a00;padding:.5rem 1rem}\
form p{margin:1rem 0}";

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n{body}\n</body>\n</html>\n"
    )
}

/// Upload form with an optional error notice
pub fn upload_form(error: Option<&str>, selected: TtsEngine) -> String {
    let notice = error
        .map(|msg| format!("<p class=\"error\">{}</p>\n", clean_text(msg)))
        .unwrap_or_default();

    let options: String = TtsEngine::ALL
        .iter()
        .map(|engine| {
            let selected = if *engine == selected { " selected" } else { "" };
            format!(
                "<option value=\"{}\"{}>{}</option>",
                engine.as_str(),
                selected,
                engine.label()
            )
        })
        .collect();

    let body = format!(
        "<h1>Lecture Synth</h1>\n\
         <p>Upload lecture notes (PDF or image) and get them back as a spoken lecture.</p>\n\
         {notice}\
         <form method=\"post\" action=\"/\" enctype=\"multipart/form-data\">\n\
         <p><input type=\"file\" name=\"document\" \
         accept=\".pdf,.png,.jpg,.jpeg,.bmp,.gif,.tiff,.webp\"></p>\n\
         <p><label>Voice engine <select name=\"tts\">{options}</select></label></p>\n\
         <p><button type=\"submit\">Generate lecture</button></p>\n\
         </form>"
    );
    layout("Lecture Synth", &body)
}

/// Player page for a finished job
pub fn result_page(job_id: &str, audio_filename: &str) -> String {
    let job_id = clean_text(job_id);
    let audio = clean_text(audio_filename);
    let body = format!(
        "<h1>Your lecture is ready</h1>\n\
         <p>Job <code>{job_id}</code></p>\n\
         <audio controls src=\"/listen/{audio}\"></audio>\n\
         <p><a href=\"/download/{audio}\">Download {audio}</a></p>\n\
         <p><a href=\"/\">Convert another document</a></p>"
    );
    layout("Lecture ready", &body)
}
