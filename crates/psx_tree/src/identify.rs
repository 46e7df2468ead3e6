//! Which release a disc directory holds.
//!
//! Identification is an ordered list of rules. Each rule has a gate of marker
//! checks; the first rule whose gate matches decides the result, and its
//! candidates are tried in order. A gate that matches with no matching
//! candidate means the title is known but the release is not, which is
//! reported as no game rather than falling through to later rules.

use std::path::Path;

use derive_more::Display;
use md5::{Digest, Md5};
use tracing::{debug, info, warn};

use Check::{Contains, Exists, Missing};
use VersionedGame as G;

/// Exact release of a supported title
#[allow(non_camel_case_types)]
#[derive(Display, Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum VersionedGame {
    #[display("Armored Core (US)")]
    Acu,
    #[display("Armored Core (JP demo, D2)")]
    AcjDemoD2,
    #[display("Armored Core (JP demo, HR7)")]
    AcjDemoHr7,
    #[display("Armored Core (US demo, ISV4)")]
    AcuDemoIsv4,
    #[display("Armored Core (US demo, PUG3)")]
    AcuDemoPug3,
    #[display("Armored Core (JP demo, T977)")]
    AcjDemoT977,
    #[display("Armored Core (prototype)")]
    AcuProto,
    #[display("King's Field (JP)")]
    Kf,
    #[display("King's Field (JP demo)")]
    KfjDemo,
    #[display("King's Field II (EU)")]
    Kf2E,
    #[display("King's Field II (JP 1.0)")]
    Kf2Jv1_0,
    #[display("King's Field II (JP 1.7)")]
    Kf2Jv1_7,
    #[display("King's Field II (JP 1.8A)")]
    Kf2Jv1_8A,
    #[display("King's Field II (JP 1.8B)")]
    Kf2Jv1_8B,
    #[display("King's Field II (US)")]
    Kf2U,
    #[display("King's Field III (JP 1.3)")]
    Kf3Jv1_3,
    #[display("King's Field III (JP 1.4)")]
    Kf3Jv1_4,
    #[display("King's Field III (US)")]
    Kf3U,
    #[display("King's Field III: Pilot Style")]
    Kfps,
    #[display("Shadow Tower")]
    St,
    #[display("Shadow Tower (demo)")]
    StDemo,
}

/// Title without release details
#[derive(Display, Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SimpleGame {
    #[display("Armored Core")]
    Ac,
    #[display("King's Field")]
    Kf,
    #[display("King's Field II")]
    Kf2,
    #[display("King's Field III")]
    Kf3,
    #[display("King's Field III: Pilot Style")]
    Kfps,
    #[display("Shadow Tower")]
    St,
}

impl VersionedGame {
    pub const fn simple(&self) -> SimpleGame {
        use VersionedGame::*;
        match self {
            Acu | AcjDemoD2 | AcjDemoHr7 | AcuDemoIsv4 | AcuDemoPug3 | AcjDemoT977 | AcuProto => {
                SimpleGame::Ac
            }
            Kf | KfjDemo => SimpleGame::Kf,
            Kf2E | Kf2Jv1_0 | Kf2Jv1_7 | Kf2Jv1_8A | Kf2Jv1_8B | Kf2U => SimpleGame::Kf2,
            Kf3Jv1_3 | Kf3Jv1_4 | Kf3U => SimpleGame::Kf3,
            Kfps => SimpleGame::Kfps,
            St | StDemo => SimpleGame::St,
        }
    }
}

/// One check against the source directory
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Check {
    Exists(&'static str),
    Missing(&'static str),
    /// MD5 of a file, as lowercase hex
    Md5 {
        file: &'static str,
        digest: &'static str,
    },
    /// Byte substring of a small text file
    Contains {
        file: &'static str,
        token: &'static str,
    },
}

impl Check {
    /// Unreadable files never match
    pub fn matches(&self, dir: &Path) -> bool {
        let matched = match self {
            Check::Exists(file) => dir.join(file).exists(),
            Check::Missing(file) => !dir.join(file).exists(),
            Check::Md5 { file, digest } => std::fs::read(dir.join(file))
                .map(|data| hex::encode(Md5::digest(data)) == *digest)
                .unwrap_or(false),
            Check::Contains { file, token } => std::fs::read(dir.join(file))
                .map(|data| {
                    data.windows(token.len())
                        .any(|window| window == token.as_bytes())
                })
                .unwrap_or(false),
        };
        debug!(check = ?self, matched, "check");
        matched
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameProfile {
    pub game: VersionedGame,
    /// Checks beyond the rule gate that pick this release
    pub checks: &'static [Check],
    /// File name of this release's manifest
    pub manifest: &'static str,
    /// Whether the manifest covers the whole disc
    pub complete: bool,
}

impl GameProfile {
    pub const fn simple(&self) -> SimpleGame {
        self.game.simple()
    }
}

#[derive(Debug)]
pub struct Rule {
    pub gate: &'static [Check],
    pub candidates: &'static [GameProfile],
}

const fn profile(game: VersionedGame, manifest: &'static str) -> GameProfile {
    GameProfile {
        game,
        checks: &[],
        manifest,
        complete: false,
    }
}

const fn complete(game: VersionedGame, manifest: &'static str) -> GameProfile {
    GameProfile {
        game,
        checks: &[],
        manifest,
        complete: true,
    }
}

const fn versioned(
    game: VersionedGame,
    checks: &'static [Check],
    manifest: &'static str,
    complete: bool,
) -> GameProfile {
    GameProfile {
        game,
        checks,
        manifest,
        complete,
    }
}

/// Every known release, in the order they are tried
pub static RULES: &[Rule] = &[
    Rule {
        gate: &[],
        candidates: &[
            versioned(G::Acu, &[Exists("SCUS_941.82")], "ACU.csv", false),
            versioned(G::Acu, &[Exists("SLUS_013.23")], "ACU.csv", false),
        ],
    },
    Rule {
        gate: &[Exists("STR"), Exists("AC.EXE")],
        candidates: &[profile(G::AcjDemoD2, "ACJDemoD2.csv")],
    },
    Rule {
        gate: &[Exists("STR"), Exists("DEMO1")],
        candidates: &[profile(G::AcjDemoHr7, "ACJDemoHR7.csv")],
    },
    Rule {
        gate: &[Exists("USA10.EXE")],
        candidates: &[
            versioned(G::AcuDemoIsv4, &[Exists("COM/DEMO00.XA")], "ACUDemoISV4.csv", false),
            versioned(G::AcuDemoPug3, &[Exists("COM/DEMO01.XA")], "ACUDemoPUG3.csv", false),
        ],
    },
    Rule {
        gate: &[Missing("STR"), Exists("AC.EXE")],
        candidates: &[profile(G::AcjDemoT977, "ACJDemoT977.csv")],
    },
    Rule {
        gate: &[Exists("SLPS_009.00")],
        candidates: &[profile(G::AcuProto, "ACUProto.csv")],
    },
    Rule {
        gate: &[
            Exists("PSX.EXE"),
            Exists("E0"),
            Exists("E1"),
            Exists("E2"),
            Exists("E3"),
        ],
        candidates: &[profile(G::Kf, "KF.csv")],
    },
    Rule {
        gate: &[Exists("KFIELD.EXE"), Exists("MAP.001")],
        candidates: &[profile(G::KfjDemo, "KFJDemo.csv")],
    },
    Rule {
        gate: &[Exists("SCES_005.10"), Exists("END.EXE"), Exists("LICENSEE.DAT")],
        candidates: &[complete(G::Kf2E, "KF2E.csv")],
    },
    Rule {
        gate: &[
            Exists("END.EXE"),
            Exists("GAME.EXE"),
            Exists("OPEN.EXE"),
            Exists("PSX.EXE"),
        ],
        candidates: &[
            versioned(
                G::Kf2Jv1_0,
                &[Check::Md5 {
                    file: "GAME.EXE",
                    digest: "20e673906133201fded29b3af6d7b6cd",
                }],
                "KF2Jv1_0.csv",
                true,
            ),
            versioned(
                G::Kf2Jv1_7,
                &[Check::Md5 {
                    file: "GAME.EXE",
                    digest: "5522e7cdeb6c0261befd6eedf95065a3",
                }],
                "KF2Jv1_7.csv",
                false,
            ),
        ],
    },
    Rule {
        gate: &[Exists("SLPS_910.03")],
        candidates: &[
            versioned(
                G::Kf2Jv1_8A,
                &[Contains {
                    file: "COPY.TXT",
                    token: "1.8A",
                }],
                "KF2Jv1_8A.csv",
                true,
            ),
            versioned(
                G::Kf2Jv1_8B,
                &[Contains {
                    file: "COPY.TXT",
                    token: "1.8B",
                }],
                "KF2Jv1_8B.csv",
                true,
            ),
        ],
    },
    Rule {
        gate: &[Exists("SLUS_001.58")],
        candidates: &[complete(G::Kf2U, "KF2U.csv")],
    },
    Rule {
        gate: &[Exists("SLPS_003.77")],
        candidates: &[
            versioned(
                G::Kf3Jv1_3,
                &[Contains {
                    file: "COPY.TXT",
                    token: "1.3",
                }],
                "KF3Jv1_3.csv",
                false,
            ),
            versioned(
                G::Kf3Jv1_4,
                &[Contains {
                    file: "COPY.TXT",
                    token: "1.4",
                }],
                "KF3Jv1_4.csv",
                false,
            ),
        ],
    },
    Rule {
        gate: &[Exists("SLUS_002.55")],
        candidates: &[profile(G::Kf3U, "KF3U.csv")],
    },
    Rule {
        gate: &[Exists("SLPM_800.29")],
        candidates: &[profile(G::Kfps, "KFPS.csv")],
    },
    Rule {
        gate: &[Exists("END.EXE"), Exists("ST.EXE"), Exists("OPTXT.EXE")],
        candidates: &[profile(G::St, "ST.csv")],
    },
    Rule {
        gate: &[Exists("ST.EXE"), Exists("TITLE.MIC"), Exists("TITLE.XA")],
        candidates: &[profile(G::StDemo, "STDemo.csv")],
    },
];

/// Find the release stored in `dir`. Never fails; unknown is `None`.
pub fn identify(dir: &Path) -> Option<&'static GameProfile> {
    identify_with(RULES, dir)
}

pub fn identify_with<'r>(rules: &'r [Rule], dir: &Path) -> Option<&'r GameProfile> {
    for rule in rules {
        if !rule.gate.iter().all(|check| check.matches(dir)) {
            continue;
        }

        // an empty gate only groups its candidates
        let found = rule
            .candidates
            .iter()
            .find(|candidate| candidate.checks.iter().all(|check| check.matches(dir)));
        if found.is_none() && rule.gate.is_empty() {
            continue;
        }

        match found {
            Some(profile) => info!(game = %profile.game, "identified"),
            None => warn!(
                dir = %dir.display(),
                "title recognised but this release is unknown"
            ),
        }
        return found;
    }

    debug!(dir = %dir.display(), "no known game");
    None
}
