//! Tags that describe how a node is stored and what it holds.

use std::str::FromStr;

use derive_more::Display;

use crate::error::Error;

/// How a file is stored, as named in manifests
#[derive(Display, Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FileFormat {
    /// Directory on disc, children come from the manifest
    Folder,
    /// Concatenated members, with or without length prefixes
    #[display("MIX")]
    Mix,
    /// Opaque bytes
    Raw,
    /// Sector aligned members behind a 16 bit index table
    T,
    /// Count word followed by self-sized members
    #[display("MIMList")]
    MimList,
    /// Top of the tree, never read from a manifest
    Root,
}

impl FileFormat {
    pub const fn is_container(&self) -> bool {
        matches!(self, FileFormat::Mix | FileFormat::T | FileFormat::MimList)
    }
}

impl FromStr for FileFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Folder" => Ok(FileFormat::Folder),
            "MIX" => Ok(FileFormat::Mix),
            "Raw" => Ok(FileFormat::Raw),
            "T" => Ok(FileFormat::T),
            "MIMList" => Ok(FileFormat::MimList),
            _ => Err(Error::CustomError(format!("unknown file format {s}"))),
        }
    }
}

/// What a node holds. Editors downstream pick their view from this tag.
#[derive(Display, Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub enum DataType {
    Container,
    GameDatabase,
    MapTile,
    MapTilemap,
    MapDatabase,
    MapScript,
    Model,
    MusicSequence,
    SoundBankBody,
    SoundBankHeader,
    Texture,
    TextureBank,
    #[default]
    Unknown,
    #[display("KF1_ArmourParams")]
    Kf1ArmourParams,
    #[display("KF1_LevelCurve")]
    Kf1LevelCurve,
    #[display("KF1_MagicParams")]
    Kf1MagicParams,
    #[display("KF1_WeaponParams")]
    Kf1WeaponParams,
    #[display("KF2_ArmourParams")]
    Kf2ArmourParams,
    #[display("KF2_GameExec")]
    Kf2GameExec,
    #[display("KF2_LevelCurve")]
    Kf2LevelCurve,
    #[display("KF2_MagicParams")]
    Kf2MagicParams,
    #[display("KF2_ModelPack_MO")]
    Kf2ModelPackMo,
    #[display("KF2_ModelPack_TMD")]
    Kf2ModelPackTmd,
    #[display("KF2_ObjectClasses")]
    Kf2ObjectClasses,
    #[display("KF2_SoundEffectParams")]
    Kf2SoundEffectParams,
    #[display("KF2_TileRenderParams")]
    Kf2TileRenderParams,
    #[display("KF2_WeaponParams")]
    Kf2WeaponParams,
    Root,
}

impl DataType {
    pub const ALL: [DataType; 28] = [
        DataType::Container,
        DataType::GameDatabase,
        DataType::MapTile,
        DataType::MapTilemap,
        DataType::MapDatabase,
        DataType::MapScript,
        DataType::Model,
        DataType::MusicSequence,
        DataType::SoundBankBody,
        DataType::SoundBankHeader,
        DataType::Texture,
        DataType::TextureBank,
        DataType::Unknown,
        DataType::Kf1ArmourParams,
        DataType::Kf1LevelCurve,
        DataType::Kf1MagicParams,
        DataType::Kf1WeaponParams,
        DataType::Kf2ArmourParams,
        DataType::Kf2GameExec,
        DataType::Kf2LevelCurve,
        DataType::Kf2MagicParams,
        DataType::Kf2ModelPackMo,
        DataType::Kf2ModelPackTmd,
        DataType::Kf2ObjectClasses,
        DataType::Kf2SoundEffectParams,
        DataType::Kf2TileRenderParams,
        DataType::Kf2WeaponParams,
        DataType::Root,
    ];
}

impl FromStr for DataType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // short names used by older manifests
        match s {
            "GameDB" => return Ok(DataType::GameDatabase),
            "MapDB" => return Ok(DataType::MapDatabase),
            "TextureDB" => return Ok(DataType::TextureBank),
            _ => {}
        }

        DataType::ALL
            .into_iter()
            .find(|t| t.to_string() == s)
            .ok_or_else(|| Error::CustomError(format!("unknown data type {s}")))
    }
}
