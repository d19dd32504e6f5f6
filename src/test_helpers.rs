//! Shared test utilities for the sitekit test suite.
//!
//! [`write_fixture_site`] builds a small but complete source tree in place:
//! two pages extending a layout, a partial, an entry stylesheet with a
//! partial and a `background-image` rule, two scripts, a real PNG, a couple
//! of passthrough images, and a font. Everything tests need to exercise the
//! scan, process, and generate stages end to end.

use std::fs;
use std::path::Path;

/// Write the standard fixture site under `root`.
pub fn write_fixture_site(root: &Path) {
    for dir in [
        "layouts",
        "partials",
        "assets/scss",
        "assets/js",
        "assets/images",
        "assets/fonts",
    ] {
        fs::create_dir_all(root.join(dir)).unwrap();
    }

    fs::write(
        root.join("layouts/base.html"),
        "<!doctype html>\n<html>\n<head><title>{% block title %}Site{% endblock %}</title></head>\n<body>\n{% include \"partials/header.html\" %}\n<main>{% block content %}{% endblock %}</main>\n</body>\n</html>\n",
    )
    .unwrap();

    fs::write(
        root.join("partials/header.html"),
        "<header class=\"site-header\"><nav>Navigation</nav></header>\n",
    )
    .unwrap();

    fs::write(
        root.join("index.html"),
        "{% extends \"layouts/base.html\" %}\n{% block content %}<h1>Welcome</h1>{% endblock %}\n",
    )
    .unwrap();

    fs::write(
        root.join("about.html"),
        "{% extends \"layouts/base.html\" %}\n{% block title %}About{% endblock %}\n{% block content %}<h1>About this site</h1>{% endblock %}\n",
    )
    .unwrap();

    fs::write(
        root.join("assets/scss/_variables.scss"),
        "$accent: #336699;\n",
    )
    .unwrap();

    fs::write(
        root.join("assets/scss/style.scss"),
        "@use \"variables\";\n\n.hero {\n  background-image: url(\"../images/hero.png\");\n  color: variables.$accent;\n}\n",
    )
    .unwrap();

    fs::write(
        root.join("assets/js/main.js"),
        "function initNav() {\n    return true;\n}\n",
    )
    .unwrap();

    fs::write(
        root.join("assets/js/menu.js"),
        "function toggleMenu() {\n    return false;\n}\n",
    )
    .unwrap();

    write_png(&root.join("assets/images/hero.png"), 8, 6);

    fs::write(
        root.join("assets/images/logo.svg"),
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"10\" height=\"10\"/>\n",
    )
    .unwrap();

    // Passthrough bytes only; the pipeline never decodes GIFs
    fs::write(root.join("assets/images/anim.gif"), b"GIF89a\x01\x00\x01\x00").unwrap();

    fs::write(root.join("assets/fonts/site.woff2"), b"wOF2 fake font").unwrap();
}

/// Write a real decodable PNG at the given size.
pub fn write_png(path: &Path, width: u32, height: u32) {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x * 30 % 256) as u8, (y * 40 % 256) as u8, 128])
    });
    img.save(path).unwrap();
}
