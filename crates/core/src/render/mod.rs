//! Static HTML rendering of the page model with Maud.
//!
//! Every element that takes part in an animation carries the id the
//! behavioral components address it by, and reveal containers are marked
//! with `data-reveal`. Initial visibility is left to the browser shell that
//! consumes the manifest, so the document reads correctly without scripts.

use maud::{html, Markup, DOCTYPE};

use crate::{
    background::LAYER_Z_INDEX,
    content::{DisplayItem, Icon, LinkTarget, SocialLink, MAX_RATING},
    page::{child_id, PageModel, SectionId, REVIEW_CARD_ID},
    Result,
};

/// Renders the complete document.
pub fn render_document(model: &PageModel) -> String {
    let config = model.config();
    html! {
        (DOCTYPE)
        html lang=(config.page.lang) {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (config.page.title) }
            }
            body {
                @if config.background.enabled {
                    (background_layer(model))
                }
                main {
                    (hero(model))
                    (about(model))
                    (portfolio(model))
                    (reviews(model))
                    (contact(model))
                }
                (footer(model))
            }
        }
    }
    .into_string()
}

/// JSON description of reveal groups, the intro schedule and the carousel.
pub fn reveal_manifest(model: &PageModel) -> Result<String> {
    Ok(serde_json::to_string_pretty(&model.manifest())?)
}

fn icon(icon: Icon) -> Markup {
    html! {
        span.icon data-icon=(icon.name()) aria-hidden="true" {}
    }
}

fn link(target: &LinkTarget, label: &str, body: Markup) -> Markup {
    let new_tab = target.opens_new_tab();
    html! {
        a href=(target.href())
            aria-label=(label)
            target=[new_tab.then_some("_blank")]
            rel=[new_tab.then_some("noopener noreferrer")] {
            (body)
        }
    }
}

fn social_links(socials: &[SocialLink], id_prefix: Option<&str>) -> Markup {
    html! {
        ul.socials {
            @for (index, social) in socials.iter().enumerate() {
                li id=[id_prefix.map(|prefix| child_id(prefix, index))] {
                    (link(&social.href, &social.label, icon(social.icon)))
                }
            }
        }
    }
}

fn tags(values: &[String]) -> Markup {
    html! {
        @if !values.is_empty() {
            ul.tags {
                @for value in values {
                    li { (value) }
                }
            }
        }
    }
}

fn background_layer(model: &PageModel) -> Markup {
    let background = &model.config().background;
    let style = format!("position:fixed;inset:0;z-index:{LAYER_Z_INDEX};pointer-events:none");
    html! {
        div #background-layer
            aria-hidden="true"
            style=(style)
            data-star-count=(background.star_count)
            data-star-seed=(background.seed) {
            canvas {}
        }
    }
}

fn hero(model: &PageModel) -> Markup {
    let profile = &model.content().profile;
    html! {
        section.hero id=(SectionId::Home.anchor()) {
            div.hero-text {
                h1 id=(child_id("hero-text", 0)) {
                    "Hi, I'm " span.name { (profile.name) }
                }
                p.roles id=(child_id("hero-text", 1)) { (profile.roles.join(" | ")) }
                p.tagline id=(child_id("hero-text", 2)) { (profile.tagline) }
                div.actions {
                    a.button id=(child_id("hero-actions", 0)) href="#portfolio" { "View My Work" }
                    a.button.outline id=(child_id("hero-actions", 1)) href="#contact" {
                        "Get In Touch"
                    }
                }
                (social_links(&profile.socials, Some("hero-socials")))
            }
            img #hero-headshot src=(profile.headshot.as_str()) alt=(profile.name);
            a.scroll-indicator href="#about" aria-label="Scroll down" {
                (icon(Icon::ArrowDown))
            }
        }
    }
}

fn heading(container: &str, title: &str, intro: &str) -> Markup {
    html! {
        header data-reveal=(container) {
            h2 id=(child_id(container, 0)) { (title) }
            p id=(child_id(container, 1)) { (intro) }
        }
    }
}

fn about(model: &PageModel) -> Markup {
    let about = &model.content().about;
    html! {
        section id=(SectionId::About.anchor()) {
            (heading("about-heading", &about.heading, &about.intro))
            div.skills data-reveal="about-skills" {
                @for (index, skill) in about.skills.iter().enumerate() {
                    article.skill id=(child_id("about-skills", index)) {
                        @if let Some(skill_icon) = skill.icon {
                            (icon(skill_icon))
                        }
                        h3 { (skill.title) }
                        p { (skill.description) }
                        (tags(skill.tag("tech")))
                    }
                }
            }
            div.stats data-reveal="about-stats" {
                @for (index, stat) in about.stats.iter().enumerate() {
                    div.stat id=(child_id("about-stats", index)) {
                        (icon(stat.icon))
                        strong { (stat.number) }
                        span { (stat.label) }
                    }
                }
            }
        }
    }
}

fn project_card(container: &str, index: usize, project: &DisplayItem, tag_key: &str) -> Markup {
    html! {
        article.project.featured[project.featured] id=(child_id(container, index)) {
            @if let Some(image) = &project.image {
                img src=(image.as_str()) alt=(project.title) loading="lazy";
            }
            @if let Some(category) = &project.category {
                span.category { (category) }
            }
            h4 { (project.title) }
            p { (project.description) }
            (tags(project.tag(tag_key)))
            @if let Some(target) = &project.link {
                (link(target, &project.title, html! { (icon(Icon::ExternalLink)) " View Live" }))
            }
        }
    }
}

fn portfolio(model: &PageModel) -> Markup {
    let portfolio = &model.content().portfolio;
    html! {
        section id=(SectionId::Portfolio.anchor()) {
            (heading("portfolio-heading", &portfolio.heading, &portfolio.intro))
            div data-reveal="portfolio-web-title" {
                h3 id=(child_id("portfolio-web-title", 0)) { "Web Development" }
            }
            div.projects data-reveal="portfolio-web" {
                @for (index, project) in portfolio.web_projects.iter().enumerate() {
                    (project_card("portfolio-web", index, project, "tech"))
                }
            }
            div data-reveal="portfolio-graphic-title" {
                h3 id=(child_id("portfolio-graphic-title", 0)) { "Graphic Design" }
            }
            div.gallery data-reveal="portfolio-graphic" {
                @for (index, project) in portfolio.graphic_projects.iter().enumerate() {
                    button.gallery-item type="button" data-lightbox-index=(index) {
                        (project_card("portfolio-graphic", index, project, "tools"))
                    }
                }
            }
            div #lightbox role="dialog" aria-modal="true" hidden {}
        }
    }
}

fn stars(rating: u8) -> Markup {
    html! {
        div.rating aria-label=(format!("{rating} out of {MAX_RATING}")) {
            @for _ in 0..rating {
                (icon(Icon::Star))
            }
        }
    }
}

fn reviews(model: &PageModel) -> Markup {
    let reviews = &model.content().reviews;
    let carousel = &model.config().carousel;
    html! {
        section id=(SectionId::Reviews.anchor()) {
            (heading("reviews-heading", &reviews.heading, &reviews.intro))
            div.carousel
                data-interval-ms=(carousel.interval_ms)
                data-length=(reviews.testimonials.len()) {
                @if let Some(current) = reviews.testimonials.first() {
                    article id=(REVIEW_CARD_ID) data-cursor="0" {
                        (stars(current.rating().unwrap_or(MAX_RATING)))
                        blockquote { (current.description) }
                        footer {
                            @if let Some(image) = &current.image {
                                img src=(image.as_str()) alt=(current.title);
                            }
                            strong { (current.title) }
                            @if !current.subtitle.is_empty() {
                                span { (current.subtitle) }
                            }
                        }
                    }
                }
                nav.carousel-controls {
                    button type="button" data-carousel="previous" aria-label="Previous review" {
                        "‹"
                    }
                    @for index in 0..reviews.testimonials.len() {
                        span.dot.active[index == 0] data-index=(index) {}
                    }
                    button type="button" data-carousel="next" aria-label="Next review" { "›" }
                }
            }
        }
    }
}

fn contact(model: &PageModel) -> Markup {
    let contact = &model.content().contact;
    html! {
        section id=(SectionId::Contact.anchor()) {
            (heading("contact-heading", &contact.heading, &contact.intro))
            div.contact-info data-reveal="contact-info" {
                div id=(child_id("contact-info", 0)) {
                    h3 { "Let's work together" }
                    p { (contact.blurb) }
                }
                ul id=(child_id("contact-info", 1)) {
                    @for entry in &contact.entries {
                        li {
                            (icon(entry.icon))
                            span.label { (entry.label) }
                            (link(&entry.href, &entry.label, html! { (entry.value) }))
                        }
                    }
                }
                div id=(child_id("contact-info", 2)) {
                    (social_links(&contact.socials, None))
                }
            }
            // No action: submissions are not handled.
            form #contact-form data-reveal="contact-form" {
                div.form-row id=(child_id("contact-form", 0)) {
                    label {
                        "Name" input type="text" name="name" placeholder="Your name" required;
                    }
                    label {
                        "Email"
                        input type="email" name="email" placeholder="your@email.com" required;
                    }
                }
                label id=(child_id("contact-form", 1)) {
                    "Subject"
                    input type="text" name="subject" placeholder="Project inquiry" required;
                }
                label id=(child_id("contact-form", 2)) {
                    "Message" textarea name="message" rows="5" required {}
                }
                button id=(child_id("contact-form", 3)) type="submit" {
                    (icon(Icon::Send)) " Send Message"
                }
            }
        }
    }
}

fn footer(model: &PageModel) -> Markup {
    let content = model.content();
    let footer = &content.footer;
    let year = model.config().page.copyright_year();
    html! {
        footer id=(SectionId::Footer.anchor()) data-reveal="footer-columns" {
            div id=(child_id("footer-columns", 0)) {
                strong { (content.profile.name) }
                p { (footer.blurb) }
                (social_links(&footer.socials, None))
            }
            nav id=(child_id("footer-columns", 1)) {
                h4 { "Quick Links" }
                ul {
                    @for nav in &footer.quick_links {
                        li { a href=(nav.href.href()) { (nav.name) } }
                    }
                }
            }
            div id=(child_id("footer-columns", 2)) {
                h4 { "Contact" }
                p { (footer.email) }
                p { (footer.phone) }
            }
            p.copyright id=(child_id("footer-columns", 3)) {
                "© " (year) " " (content.profile.name) ". Made with " (icon(Icon::Heart))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::SiteConfig, content::SiteContent};

    fn model() -> PageModel {
        let mut config = SiteConfig::default();
        config.page.copyright_year = Some(2024);
        PageModel::new(SiteContent::builtin().unwrap(), config)
    }

    #[test]
    fn renders_every_section_anchor() {
        let html = render_document(&model());
        assert!(html.starts_with("<!DOCTYPE html>"));
        for section in SectionId::ALL {
            assert!(html.contains(&format!("id=\"{}\"", section.anchor())), "{section:?}");
        }
    }

    #[test]
    fn marks_every_reveal_container_and_child() {
        let model = model();
        let html = render_document(&model);
        for group in model.reveal_groups() {
            assert!(html.contains(&format!("data-reveal=\"{}\"", group.container)));
            for child in &group.children {
                assert!(html.contains(&format!("id=\"{child}\"")), "{child}");
            }
        }
        for event in model.intro().schedule() {
            assert!(html.contains(&format!("id=\"{}\"", event.target)), "{}", event.target);
        }
    }

    #[test]
    fn background_sits_behind_content_and_ignores_pointer() {
        let html = render_document(&model());
        assert!(html.contains("z-index:-10"));
        assert!(html.contains("pointer-events:none"));

        let mut model = model();
        let mut config = model.config().clone();
        config.background.enabled = false;
        model = PageModel::new(model.content().clone(), config);
        assert!(!render_document(&model).contains("background-layer"));
    }

    #[test]
    fn contact_form_has_no_action() {
        let html = render_document(&model());
        let form = &html[html.find("<form").unwrap()..];
        let tag = &form[..form.find('>').unwrap()];
        assert!(!tag.contains("action"));
    }

    #[test]
    fn contact_form_collects_subject() {
        let model = model();
        let html = render_document(&model);
        let start = html.find("<form").unwrap();
        let end = start + html[start..].find("</form>").unwrap();
        let form = &html[start..end];

        for field in ["name", "email", "subject", "message"] {
            assert!(form.contains(&format!("name=\"{field}\"")), "{field}");
        }
        let group = model.reveal_group("contact-form").unwrap();
        assert_eq!(group.children.len(), 4);
        assert!(form.contains("id=\"contact-form-1\""));
        assert!(form.find("name=\"subject\"") > form.find("id=\"contact-form-1\""));
    }

    #[test]
    fn external_links_open_in_new_tab() {
        let html = render_document(&model());
        assert!(html.contains("target=\"_blank\""));
        assert!(html.contains("href=\"#portfolio\""));
        assert!(html.contains("© 2024"));
    }

    #[test]
    fn content_text_is_escaped() {
        let mut content = SiteContent::builtin().unwrap();
        content.profile.name = "<script>alert(1)</script>".to_string();
        let html = render_document(&PageModel::new(content, SiteConfig::default()));
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn manifest_is_valid_json() {
        let manifest = reveal_manifest(&model()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&manifest).unwrap();
        assert_eq!(value["carousel"]["target"], REVIEW_CARD_ID);
        assert!(value["intro"].as_array().unwrap().len() >= 6);
    }
}
