//! UI routes - the upload form
//!
//! Vanilla HTML/CSS/JS; the page posts to /api/submissions and renders the
//! returned messages.

use axum::{
    response::{Html, IntoResponse},
    routing::get,
    Router,
};

use crate::AppState;

/// Build UI routes
pub fn ui_routes() -> Router<AppState> {
    Router::new().route("/", get(upload_page))
}

/// GET / - upload form
async fn upload_page() -> impl IntoResponse {
    Html(UPLOAD_PAGE)
}

const UPLOAD_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>IGBO Dataset Uploader</title>
    <style>
        body {
            font-family: system-ui, -apple-system, sans-serif;
            max-width: 800px;
            margin: 40px auto;
            padding: 20px;
            line-height: 1.6;
        }
        h1 {
            color: #333;
            border-bottom: 2px solid #0066cc;
            padding-bottom: 10px;
        }
        label {
            display: block;
            margin-top: 14px;
            font-weight: 600;
        }
        input[type=text], select {
            width: 100%;
            padding: 8px;
            box-sizing: border-box;
        }
        button {
            margin-top: 20px;
            padding: 10px 20px;
            background: #0066cc;
            color: white;
            border: none;
            border-radius: 4px;
            cursor: pointer;
        }
        button:disabled {
            background: #8aa9cc;
            cursor: wait;
        }
        audio {
            display: none;
            width: 100%;
            margin-top: 10px;
        }
        #messages {
            list-style: none;
            padding: 0;
            margin-top: 20px;
        }
        #messages li {
            padding: 8px 12px;
            margin: 6px 0;
            border-radius: 4px;
        }
        .info { background: #eef4fb; }
        .success { background: #e6f6e6; }
        .warning { background: #fff6dc; }
        .error { background: #fde8e8; }
    </style>
</head>
<body>
    <h1>IGBO Dataset Uploader</h1>
    <p>Welcome to the IGBO Dataset Uploader! Upload audio files and their corresponding
    text to create a dataset for IGBO TTS (Text-to-Speech) systems.</p>
    <p>Please make sure the text matches what is spoken in the audio.</p>

    <form id="upload-form">
        <label for="text">Type in the igbo text you want to upload:</label>
        <input type="text" id="text" name="text" placeholder="e.g., Ndewo, Kedu?">

        <label for="gender">Select Gender (optional)</label>
        <select id="gender" name="gender">
            <option value="">-</option>
            <option value="female">Female</option>
            <option value="male">Male</option>
        </select>

        <label for="age">Enter Age (optional):</label>
        <input type="text" id="age" name="age" placeholder="e.g., 25">

        <label for="dialect">Enter Dialect (optional):</label>
        <input type="text" id="dialect" name="dialect" placeholder="e.g., anambra">

        <label for="audio">Choose an audio file (wav, mp3, ogg, flac, m4a)</label>
        <input type="file" id="audio" name="audio" accept=".wav,.mp3,.ogg,.flac,.m4a,audio/*">
        <audio id="preview" controls></audio>

        <button type="submit" id="upload-button">Upload</button>
    </form>

    <ul id="messages"></ul>

    <script>
        const form = document.getElementById('upload-form');
        const fileInput = document.getElementById('audio');
        const preview = document.getElementById('preview');
        const button = document.getElementById('upload-button');
        const messages = document.getElementById('messages');

        function show(level, text) {
            const li = document.createElement('li');
            li.className = level;
            li.textContent = text;
            messages.appendChild(li);
        }

        fileInput.addEventListener('change', () => {
            const file = fileInput.files[0];
            if (file) {
                preview.src = URL.createObjectURL(file);
                preview.style.display = 'block';
            } else {
                preview.removeAttribute('src');
                preview.style.display = 'none';
            }
        });

        form.addEventListener('submit', async (event) => {
            event.preventDefault();
            messages.innerHTML = '';
            if (!fileInput.files[0]) {
                show('warning', 'Please choose an audio file.');
                return;
            }

            button.disabled = true;
            show('info', 'Processing your upload...');
            try {
                const response = await fetch('/api/submissions', {
                    method: 'POST',
                    body: new FormData(form),
                });
                const body = await response.json();
                messages.innerHTML = '';
                if (!response.ok) {
                    show('error', body.error ? body.error.message : response.statusText);
                    return;
                }
                body.messages.forEach(m => show(m.level, m.message));
                if (body.state === 'DONE') {
                    form.reset();
                    preview.style.display = 'none';
                }
            } catch (err) {
                show('error', 'Upload failed: ' + err);
            } finally {
                button.disabled = false;
            }
        });
    </script>
</body>
</html>
"#;
