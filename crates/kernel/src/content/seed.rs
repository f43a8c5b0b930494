//! Sample blog posts for a fresh installation.

use tracing::info;

use crate::models::{BlogPost, BlogStatus, CreateBlogPost, StoredImage};
use crate::store::{ContentStore, StoreError};

struct SamplePost {
    title: &'static str,
    slug: &'static str,
    excerpt: &'static str,
    content: &'static str,
    image: (&'static str, &'static str),
    category: &'static str,
    tags: &'static [&'static str],
    meta_description: &'static str,
}

const SAMPLE_POSTS: &[SamplePost] = &[
    SamplePost {
        title: "Repair or Replace? Making the Call on a Failed PCB",
        slug: "repair-or-replace-failed-pcb",
        excerpt: "How we decide whether a damaged board is worth repairing.",
        content: "<p>Most failed boards can be brought back for a fraction of the cost of a \
                  replacement. We weigh part availability, damage extent, and lead time \
                  before recommending either route.</p>",
        image: ("repair-or-replace.jpg", "https://images.unsplash.com/photo-1518770660439-4636190af475?w=800&q=80"),
        category: "Repair Guides",
        tags: &["pcb", "repair", "cost"],
        meta_description: "Deciding between repairing and replacing a failed printed circuit board.",
    },
    SamplePost {
        title: "BGA Rework: What Happens on the Bench",
        slug: "bga-rework-on-the-bench",
        excerpt: "A walk through removal, site preparation, reballing, and placement.",
        content: "<p>Ball grid array rework needs controlled heating profiles. The package is \
                  lifted, pads are cleaned and fluxed, and a reballed or new part is placed \
                  and reflowed, then inspected by X-ray.</p>",
        image: ("bga-rework.jpg", "https://images.unsplash.com/photo-1555664424-778a1e5e1b48?w=800&q=80"),
        category: "Techniques",
        tags: &["bga", "rework", "reflow"],
        meta_description: "Step by step through a BGA rework job.",
    },
    SamplePost {
        title: "Spotting Corrosion Damage Early",
        slug: "spotting-corrosion-damage",
        excerpt: "Signs of moisture and electrolyte leakage on assembled boards.",
        content: "<p>Green or white residue around capacitors and connectors is the usual first \
                  sign. Caught early, cleaning and trace repair restore the board.</p>",
        image: ("corrosion.jpg", "https://images.unsplash.com/photo-1601132359864-c974e79890ac?w=800&q=80"),
        category: "Diagnostics",
        tags: &["corrosion", "inspection", "maintenance"],
        meta_description: "Recognise corrosion on circuit boards before it causes failures.",
    },
    SamplePost {
        title: "Why Industrial Controllers Fail",
        slug: "why-industrial-controllers-fail",
        excerpt: "Heat, vibration, and power events behind most field failures.",
        content: "<p>Aged electrolytic capacitors, cracked solder joints, and surge-damaged \
                  regulators account for most of the controller boards we receive.</p>",
        image: ("controllers.jpg", "https://images.unsplash.com/photo-1581092160562-40aa08e78837?w=800&q=80"),
        category: "Diagnostics",
        tags: &["industrial", "capacitors", "failure-analysis"],
        meta_description: "Common causes of industrial controller board failures.",
    },
    SamplePost {
        title: "Trace and Pad Repair Explained",
        slug: "trace-and-pad-repair",
        excerpt: "Restoring lifted pads and broken traces to spec.",
        content: "<p>Damaged copper is cut back, replaced with bonded foil or jumper wire, and \
                  sealed. The repair is tested for continuity and insulation resistance.</p>",
        image: ("trace-repair.jpg", "https://images.unsplash.com/photo-1562408590-e32931084e23?w=800&q=80"),
        category: "Techniques",
        tags: &["traces", "pads", "repair"],
        meta_description: "How lifted pads and broken traces are repaired.",
    },
];

impl SamplePost {
    fn to_input(&self) -> CreateBlogPost {
        CreateBlogPost {
            title: self.title.to_string(),
            slug: self.slug.to_string(),
            excerpt: self.excerpt.to_string(),
            content: self.content.to_string(),
            featured_image: Some(StoredImage {
                filename: self.image.0.to_string(),
                url: self.image.1.to_string(),
            }),
            source: None,
            status: BlogStatus::Published,
            category: Some(self.category.to_string()),
            tags: self.tags.iter().map(|t| t.to_string()).collect(),
            meta_title: Some(format!("{} - Electrolyte Solutions", self.title)),
            meta_description: Some(self.meta_description.to_string()),
            ..CreateBlogPost::default()
        }
    }
}

/// Result of a seeding run.
#[derive(Debug, Default)]
pub struct SeedReport {
    pub added: Vec<BlogPost>,
    /// Slugs already present in the store.
    pub skipped: Vec<String>,
}

/// Insert the sample posts whose slugs are not yet taken.
pub async fn seed_blogs(store: &dyn ContentStore) -> Result<SeedReport, StoreError> {
    let mut report = SeedReport::default();

    for sample in SAMPLE_POSTS {
        if store.slug_exists(sample.slug).await? {
            report.skipped.push(sample.slug.to_string());
            continue;
        }
        match store.insert_blog(sample.to_input()).await {
            Ok(post) => {
                info!(slug = %post.slug, "seeded blog post");
                report.added.push(post);
            }
            Err(StoreError::SlugConflict(slug)) => report.skipped.push(slug),
            Err(e) => return Err(e),
        }
    }

    Ok(report)
}
