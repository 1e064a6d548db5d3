/// A model reply wrapped in a markdown fence the way LLMs tend to return
/// markup even when told not to.
pub fn fenced_markup_fixture() -> &'static str {
    return r#"
```html
<!DOCTYPE html>
<html>
  <body>
    <form class="login">
      <input type="email" placeholder="Email">
      <button>Sign in</button>
    </form>
  </body>
</html>
```
"#;
}

pub fn unfenced_markup_fixture() -> &'static str {
    return r#"<!DOCTYPE html>
<html>
  <body>
    <form class="login">
      <input type="email" placeholder="Email">
      <button>Sign in</button>
    </form>
  </body>
</html>"#;
}

/// Page markup as a fetch proxy would return it for a cloned URL.
pub fn page_fixture() -> &'static str {
    return r#"<html><head><title>Example Domain</title></head><body><h1>Example Domain</h1><p>This domain is for use in illustrative examples.</p></body></html>"#;
}

/// A `generateContent` reply with web grounding attached.
pub fn gemini_grounded_response_fixture() -> &'static str {
    return r#"{
  "candidates": [
    {
      "content": {
        "role": "model",
        "parts": [
          { "text": "```html\n<main>Weather</main>\n```" }
        ]
      },
      "finishReason": "STOP",
      "groundingMetadata": {
        "groundingChunks": [
          { "web": { "uri": "https://example.com/forecast", "title": "Forecast" } },
          { "web": { "uri": "https://example.com/radar", "title": "Radar" } }
        ]
      }
    }
  ]
}"#;
}
