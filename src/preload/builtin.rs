//! The pin list compiled into the library.
//!
//! A snapshot of well-known pinned sites and the certificate authorities they pin to. Hosts are
//! stored with HSTS flags as well so that `force_https` answers are available for the same
//! lookups. Applications that need a current list load one with
//! [`crate::PreloadedDatabase::from_file`].

use crate::{
    pins::{PinIdentifier, Pinset},
    preload::{
        builder::{PinPolicy, PreloadBuilder, PreloadEntry},
        PreloadedDatabase,
    },
    Error, Result,
};

// Certificate authorities
const EQUIFAX_SECURE_CA: &str = "sha1/SOZo+SvSspXXR9gjIBBPM5iQn9Q=";
const GEOTRUST_GLOBAL: &str = "sha1/wHqYaI2J+6sFZAwRfap9ZbjKzE4=";
const GEOTRUST_GLOBAL2: &str = "sha1/cTg28gIxU0crbrplRqkQFVggBQk=";
const GEOTRUST_PRIMARY: &str = "sha1/sBmJ5+/7Sq/LFI9YRjl2IkFQ4bo=";
const GEOTRUST_UNIVERSAL: &str = "sha1/h+hbY1PGI6MSjLD/u/VR/F4Z/nA=";
const GEOTRUST_UNIVERSAL2: &str = "sha1/Xk9ThoXdT57KX9wNRW99UbHcm3s=";
const VERISIGN_CLASS3: &str = "sha1/4n972HfV354KP560yw4uqe/baXc=";
const VERISIGN_CLASS3_G5: &str = "sha1/sYEIGhmkwJQf+uiVKMEkyZs0rMc=";
const THAWTE_PREMIUM_SERVER: &str = "sha1/lHPJSZf5hXkGV0PGD9yxbtK+fek=";
const GTE_CYBERTRUST_GLOBAL_ROOT: &str = "sha1/WXKPxs3K8HwI8w5P84Jr2hiGaJc=";
const ENTRUST_2048: &str = "sha1/VeAL4nlx2DbdsNINSDhIaa8ALOU=";
const ENTRUST_ROOT: &str = "sha1/aFq5GdZDS5EZdbcUlvrHO4Yu6Ms=";
const DIGICERT_EV_ROOT: &str = "sha1/gzF+YoVCU9bXeDGQ7JGQVumRueM=";
const DIGICERT_GLOBAL_ROOT: &str = "sha1/r/mIkG3eEpVdm+u/ko/cwxzOMo4=";
const DIGICERT_ASSURED_ID_ROOT: &str = "sha1/BXxfC6xIYvcHwLFzsNGv11TAn1A=";

// Site keys
const GOOGLE_BACKUP_2048: &str = "sha1/vq7OyjSnqOco9nyMCDGdy77eijM=";
const GOOGLE_G2: &str = "sha1/Q9rWMO5T+KmAym79hfRqo3mQ4Oo=";
const TOR1: &str = "sha1/juNxSTv9UANmpC9kF5GKpmWNx3Y=";
const TOR2: &str = "sha1/lia43lPolzSPVIq34Dw57uYcLD8=";
const TOR3: &str = "sha1/rzEyQIKOh77j87n5bjWUNguXF8Y=";
const TWITTER1: &str = "sha1/Vv7zwhR9TtOIN/29MFI4cgHld40=";
const FACEBOOK_BACKUP: &str = "sha1/1ww8E0AYsR2oX5lndk2hwp2Uosk=";
const SPIDEROAK1: &str = "sha1/UPGj4dP0mmd/r3VSZQchbnAmoP0=";
const SPIDEROAK2: &str = "sha1/D0fS/hquA6QprluciyO1hlFUAxg=";
const DROPBOX: &str = "sha1/8+oozGTAyHdFzG1SeuZsdHjATks=";

const TEST_SPKI: &str = "sha1/AAAAAAAAAAAAAAAAAAAAAAAAAAA=";

/// (name, accepted, rejected), in pinset id order
const PINSETS: &[(&str, &[&str], &[&str])] = &[
    ("test", &[TEST_SPKI], &[]),
    (
        "google",
        &[
            GOOGLE_BACKUP_2048,
            GOOGLE_G2,
            GEOTRUST_GLOBAL,
            GEOTRUST_PRIMARY,
            GEOTRUST_GLOBAL2,
            GEOTRUST_UNIVERSAL,
            GEOTRUST_UNIVERSAL2,
            EQUIFAX_SECURE_CA,
        ],
        &[],
    ),
    ("tor", &[TOR1, TOR2, TOR3], &[]),
    (
        "twitterCom",
        &[
            VERISIGN_CLASS3,
            VERISIGN_CLASS3_G5,
            GEOTRUST_GLOBAL,
            GEOTRUST_PRIMARY,
            GEOTRUST_GLOBAL2,
            GEOTRUST_UNIVERSAL,
            GEOTRUST_UNIVERSAL2,
            DIGICERT_EV_ROOT,
            DIGICERT_GLOBAL_ROOT,
            DIGICERT_ASSURED_ID_ROOT,
            ENTRUST_2048,
            ENTRUST_ROOT,
            GTE_CYBERTRUST_GLOBAL_ROOT,
            TWITTER1,
        ],
        &[],
    ),
    (
        "dropbox",
        &[
            DIGICERT_EV_ROOT,
            DIGICERT_GLOBAL_ROOT,
            DIGICERT_ASSURED_ID_ROOT,
            GEOTRUST_GLOBAL,
            THAWTE_PREMIUM_SERVER,
            DROPBOX,
        ],
        &[],
    ),
    (
        "facebook",
        &[
            VERISIGN_CLASS3,
            VERISIGN_CLASS3_G5,
            DIGICERT_EV_ROOT,
            FACEBOOK_BACKUP,
        ],
        &[],
    ),
    (
        "spideroak",
        &[SPIDEROAK1, SPIDEROAK2, GEOTRUST_GLOBAL, GEOTRUST_PRIMARY],
        &[],
    ),
];

/// Pinning of an entry: (pinset name, domain id, pins include subdomains)
type Pins = Option<(&'static str, u32, bool)>;

/// (hostname, include subdomains, force https, pins)
const ENTRIES: &[(&str, bool, bool, Pins)] = &[
    ("pinningtest.appspot.com", true, false, Some(("test", 1, true))),
    // Google
    ("google.com", true, false, Some(("google", 2, true))),
    ("www.google.com", true, true, Some(("google", 2, true))),
    ("accounts.google.com", true, true, Some(("google", 2, true))),
    ("mail.google.com", true, true, Some(("google", 2, true))),
    ("checkout.google.com", true, true, Some(("google", 2, true))),
    ("chrome.google.com", true, true, Some(("google", 2, true))),
    ("google.co.kr", true, false, Some(("google", 3, true))),
    ("google.co.jp", true, false, Some(("google", 4, true))),
    ("google.co.uk", true, false, Some(("google", 5, true))),
    ("google.de", true, false, Some(("google", 6, true))),
    ("google.fr", true, false, Some(("google", 7, true))),
    ("googlemail.com", false, true, Some(("google", 8, true))),
    ("googleapis.com", false, false, Some(("google", 9, true))),
    ("gstatic.com", false, false, Some(("google", 10, true))),
    ("googleusercontent.com", false, false, Some(("google", 11, true))),
    ("android.com", true, false, Some(("google", 12, true))),
    ("youtube.com", true, false, Some(("google", 13, true))),
    ("www.youtube.com", true, true, Some(("google", 13, true))),
    ("ytimg.com", true, false, Some(("google", 14, true))),
    ("googlevideo.com", true, false, Some(("google", 15, true))),
    // Tor
    ("torproject.org", false, true, Some(("tor", 16, false))),
    ("www.torproject.org", true, true, Some(("tor", 16, true))),
    ("blog.torproject.org", true, true, Some(("tor", 16, true))),
    ("check.torproject.org", true, true, Some(("tor", 16, true))),
    ("dist.torproject.org", true, true, Some(("tor", 16, true))),
    // Twitter
    ("twitter.com", false, true, Some(("twitterCom", 17, true))),
    ("www.twitter.com", true, true, Some(("twitterCom", 17, true))),
    ("api.twitter.com", true, true, Some(("twitterCom", 17, true))),
    ("oauth.twitter.com", true, true, Some(("twitterCom", 17, true))),
    ("mobile.twitter.com", true, true, Some(("twitterCom", 17, true))),
    // Dropbox
    ("dropbox.com", false, false, Some(("dropbox", 18, true))),
    ("www.dropbox.com", true, true, Some(("dropbox", 18, true))),
    // Facebook
    ("facebook.com", false, false, Some(("facebook", 19, true))),
    ("www.facebook.com", true, true, Some(("facebook", 19, true))),
    // SpiderOak
    ("spideroak.com", true, true, Some(("spideroak", 20, true))),
    // HSTS only
    ("paypal.com", false, true, None),
    ("www.paypal.com", false, true, None),
    ("lastpass.com", false, true, None),
    ("www.lastpass.com", false, true, None),
    ("stripe.com", true, true, None),
    ("github.com", true, true, None),
    ("crypto.cat", true, true, None),
    ("linode.com", false, true, None),
    ("www.linode.com", false, true, None),
    ("keyerror.com", true, true, None),
    ("noisebridge.net", false, true, None),
];

pub(crate) fn builder() -> Result<PreloadBuilder> {
    let mut builder = PreloadBuilder::new();
    for (id, (name, accepted, rejected)) in PINSETS.iter().enumerate() {
        let mut pinset = Pinset::new(id as u32, *name);
        pinset.accepted_pins = accepted.iter().map(|pin| PinIdentifier::new(*pin)).collect();
        pinset.rejected_pins = rejected.iter().map(|pin| PinIdentifier::new(*pin)).collect();
        builder = builder.pinset(pinset);
    }

    for (hostname, include_subdomains, force_https, pins) in ENTRIES {
        let mut entry = PreloadEntry::new(*hostname, *include_subdomains, *force_https);
        if let Some((pinset, domain_id, pins_include_subdomains)) = pins {
            let Some(pinset_id) = PINSETS.iter().position(|(name, _, _)| name == pinset) else {
                return Err(Error::InternalError(format!(
                    "Built-in entry '{hostname}' refers to unknown pinset '{pinset}'"
                )));
            };
            entry = entry.with_pins(PinPolicy::new(
                pinset_id as u32,
                *domain_id,
                *pins_include_subdomains,
            ));
        }
        builder = builder.entry(entry);
    }

    Ok(builder)
}

pub(crate) fn database() -> Result<PreloadedDatabase> {
    builder()?.build()
}
