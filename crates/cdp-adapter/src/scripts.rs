//! In-page scripts evaluated by the Chromium driver.
//!
//! Each script is an expression returning JSON-compatible data shaped like
//! the Rust type it is deserialized into.

use crate::selector::SelectorQuery;

const SHARED_HELPERS: &str = r#"
const TEST_ATTRS = ['data-testid', 'data-test-id', 'data-test', 'data-cy', 'data-qa'];
const INTERACTIVE = 'a[href], button, input, select, textarea, summary, [role], [tabindex]:not([tabindex="-1"]),'
  + TEST_ATTRS.map((a) => '[' + a + ']').join(',');
const clean = (v) => { if (v == null) return null; const s = String(v).replace(/\s+/g, ' ').trim(); return s.length ? s : null; };
const visible = (el) => { const r = el.getBoundingClientRect(); const st = getComputedStyle(el); return st.visibility !== 'hidden' && st.display !== 'none' && (r.width > 0 || r.height > 0); };
const labelFor = (el) => {
  const aria = clean(el.getAttribute('aria-label')); if (aria) return aria;
  const by = el.getAttribute('aria-labelledby');
  if (by) { const t = clean(by.split(/\s+/).map((id) => { const n = document.getElementById(id); return n ? n.textContent : ''; }).join(' ')); if (t) return t; }
  if (el.id) { const l = document.querySelector('label[for="' + CSS.escape(el.id) + '"]'); if (l && clean(l.textContent)) return clean(l.textContent); }
  const wrap = el.closest('label'); if (wrap && clean(wrap.textContent)) return clean(wrap.textContent);
  return clean(el.getAttribute('alt')) || clean(el.getAttribute('title'));
};
"#;

pub(crate) fn interactive_elements() -> String {
    format!(
        r#"(() => {{
{SHARED_HELPERS}
  const out = [];
  document.querySelectorAll(INTERACTIVE).forEach((el) => {{
    if (!visible(el)) return;
    const attr = TEST_ATTRS.find((a) => el.hasAttribute(a));
    const tag = el.tagName.toLowerCase();
    out.push({{
      index: out.length,
      tag,
      text: clean(tag === 'input' ? el.value : el.innerText),
      id: clean(el.id),
      classes: Array.from(el.classList),
      test_id: attr ? clean(el.getAttribute(attr)) : null,
      test_attribute: attr || null,
      role: clean(el.getAttribute('role')),
      name: labelFor(el),
      input_type: tag === 'input' ? clean(el.getAttribute('type') || 'text') : null,
      href: clean(el.getAttribute('href')),
      placeholder: clean(el.getAttribute('placeholder')),
    }});
  }});
  return out;
}})()"#
    )
}

pub(crate) fn page_facts() -> String {
    format!(
        r##"(() => {{
{SHARED_HELPERS}
  const landmarks = [];
  const mark = (name, sel) => {{ if (document.querySelector(sel)) landmarks.push(name); }};
  mark('header', 'header, [role="banner"]');
  mark('nav', 'nav, [role="navigation"]');
  mark('main', 'main, [role="main"]');
  mark('footer', 'footer, [role="contentinfo"]');
  mark('search', '[role="search"], input[type="search"], form[action*="search"]');
  const images = Array.from(document.images);
  const fields = Array.from(document.querySelectorAll('input:not([type="hidden"]):not([type="submit"]):not([type="button"]), select, textarea'));
  const firstLink = document.querySelector('a[href^="#"]');
  return {{
    landmarks,
    heading_count: document.querySelectorAll('h1, h2, h3, h4, h5, h6').length,
    h1_count: document.querySelectorAll('h1').length,
    form_count: document.forms.length,
    image_count: images.length,
    images_missing_alt: images.filter((img) => !img.hasAttribute('alt')).length,
    inputs_without_label: fields.filter((el) => !labelFor(el)).length,
    lang: clean(document.documentElement.getAttribute('lang')),
    has_skip_link: !!(firstLink && /skip/i.test(firstLink.textContent || '')),
  }};
}})()"##
    )
}

/// Script counting elements that match `query`.
pub(crate) fn count_matches(query: &SelectorQuery) -> String {
    let encoded = serde_json::to_string(query).unwrap_or_else(|_| "null".to_string());
    format!(
        r#"(() => {{
{SHARED_HELPERS}
  const q = {encoded};
  if (!q) return 0;
  const implicitRole = (el) => {{
    const explicit = el.getAttribute('role'); if (explicit) return explicit.toLowerCase();
    const tag = el.tagName.toLowerCase();
    if (tag === 'button') return 'button';
    if (tag === 'a' && el.hasAttribute('href')) return 'link';
    if (tag === 'select') return 'combobox';
    if (tag === 'textarea') return 'textbox';
    if (tag === 'input') {{
      const t = (el.getAttribute('type') || 'text').toLowerCase();
      if (['submit', 'button', 'reset'].includes(t)) return 'button';
      if (t === 'checkbox' || t === 'radio') return t;
      if (t === 'search') return 'searchbox';
      return 'textbox';
    }}
    return null;
  }};
  if (q.kind === 'css') {{
    try {{ return document.querySelectorAll(q.selector).length; }} catch (_) {{ return 0; }}
  }}
  const candidates = Array.from(document.querySelectorAll(INTERACTIVE + ', label, h1, h2, h3, h4, h5, h6, p, span, li, td'));
  if (q.kind === 'text') {{
    const want = q.value.trim();
    return candidates.filter((el) => {{
      const text = clean(el.innerText || el.value);
      if (!text) return false;
      return q.exact ? text === want : text.toLowerCase().includes(want.toLowerCase());
    }}).length;
  }}
  if (q.kind === 'role') {{
    return candidates.filter((el) => {{
      if (implicitRole(el) !== q.role) return false;
      if (q.name == null) return true;
      const name = labelFor(el) || clean(el.innerText || el.value) || '';
      return name.toLowerCase() === q.name.trim().toLowerCase();
    }}).length;
  }}
  return 0;
}})()"#
    )
}
