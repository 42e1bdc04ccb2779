//! Built-in packet declarations.
//!
//! One table per protocol release; each table lists every directory's packets in
//! declaration order. Rows are adopted through [`register_builtins`] when a catalogue is
//! constructed.

use pktcat_primitives::{Direction, ProtocolPhase, UNKNOWN_ID, VersionTag};

use crate::directory::{AdoptOutcome, DirectoryKey, DirectorySet};
use crate::error::CatalogError;
use crate::identity::{Binding, PacketDecl};

#[derive(Debug, Clone, Copy)]
enum RowKind {
	Packet { forced_async: bool },
	/// No longer sent under the table's release. Kept resolvable, deprecated.
	Removed,
	/// Old name of another row in the same directory.
	Renamed { target: &'static str },
	/// Exists only in the pre-modern wire format.
	Legacy,
}

#[derive(Debug, Clone, Copy)]
struct Row {
	name: &'static str,
	class: &'static str,
	current: i32,
	legacy: i32,
	kind: RowKind,
}

impl Row {
	const fn packet(name: &'static str, class: &'static str, current: i32, legacy: i32) -> Self {
		Self {
			name,
			class,
			current,
			legacy,
			kind: RowKind::Packet { forced_async: false },
		}
	}

	const fn forced_async(mut self) -> Self {
		self.kind = RowKind::Packet { forced_async: true };
		self
	}

	const fn removed(name: &'static str, class: &'static str, legacy: i32) -> Self {
		Self {
			name,
			class,
			current: UNKNOWN_ID,
			legacy,
			kind: RowKind::Removed,
		}
	}

	const fn renamed(name: &'static str, target: &'static str) -> Self {
		Self {
			name,
			class: "",
			current: UNKNOWN_ID,
			legacy: UNKNOWN_ID,
			kind: RowKind::Renamed { target },
		}
	}

	const fn legacy(name: &'static str, class: &'static str, legacy: i32) -> Self {
		Self {
			name,
			class,
			current: UNKNOWN_ID,
			legacy,
			kind: RowKind::Legacy,
		}
	}
}

struct DirectoryTable {
	phase: ProtocolPhase,
	direction: Direction,
	rows: &'static [Row],
}

/// Declarations valid for one protocol release.
pub struct BuiltinTable {
	version: VersionTag,
	directories: &'static [DirectoryTable],
}

impl BuiltinTable {
	pub fn version(&self) -> VersionTag {
		self.version
	}

	/// Number of packet rows, excluding renames.
	pub fn packet_count(&self) -> usize {
		self.directories
			.iter()
			.flat_map(|d| d.rows)
			.filter(|r| !matches!(r.kind, RowKind::Renamed { .. }))
			.count()
	}
}

/// Tables by release, newest first.
pub static TABLES: &[&BuiltinTable] = &[&V1_14];

/// Picks the newest table not newer than `version`, falling back to the oldest.
pub fn table_for(version: VersionTag) -> &'static BuiltinTable {
	TABLES
		.iter()
		.copied()
		.find(|t| version.at_least(t.version))
		.unwrap_or(TABLES[TABLES.len() - 1])
}

/// Adopts every row of the table matching `version` into `directories`.
///
/// Returns the number of identities adopted.
pub fn register_builtins(directories: &mut DirectorySet, version: VersionTag) -> Result<usize, CatalogError> {
	let table = table_for(version);
	if table.version != version {
		tracing::warn!(
			requested = %version,
			using = %table.version,
			"catalog.builtins.version_mismatch"
		);
	}

	let mut adopted = 0;
	for dir in table.directories {
		let key = DirectoryKey::new(dir.phase, dir.direction);
		let directory = directories.get_mut(key);
		for row in dir.rows {
			let (decl, binding) = match row.kind {
				RowKind::Renamed { target } => {
					directory.alias(row.name, target)?;
					continue;
				}
				RowKind::Packet { forced_async } => {
					let binding = Binding::new(row.name);
					let binding = if forced_async { binding.forced_async() } else { binding };
					(PacketDecl::new(dir.phase, dir.direction, row.class), binding)
				}
				RowKind::Removed => (
					PacketDecl::new(dir.phase, dir.direction, row.class),
					Binding::new(row.name).deprecated(),
				),
				RowKind::Legacy => (PacketDecl::legacy(dir.direction, row.legacy, row.class), Binding::new(row.name)),
			};
			let decl = decl.current_id(row.current).legacy_id(row.legacy).version(match row.kind {
				RowKind::Legacy => VersionTag::WORLD_UPDATE,
				_ => table.version,
			});

			match directory.adopt(decl, binding) {
				AdoptOutcome::Adopted(_) => adopted += 1,
				AdoptOutcome::AlreadyPresent(existing) => {
					return Err(CatalogError::NameConflict {
						directory: key,
						name: row.name.into(),
						existing: existing.symbolic_name().into(),
					});
				}
				AdoptOutcome::Conflict { name, existing } => {
					return Err(CatalogError::NameConflict {
						directory: key,
						name,
						existing: existing.symbolic_name().into(),
					});
				}
			}
		}
	}

	tracing::debug!(version = %table.version, adopted, "catalog.builtins.registered");
	Ok(adopted)
}

const fn table(phase: ProtocolPhase, direction: Direction, rows: &'static [Row]) -> DirectoryTable {
	DirectoryTable { phase, direction, rows }
}

use Direction::{ClientToServer as C2S, ServerToClient as S2C};
use ProtocolPhase::{Handshaking, Legacy, Login, Play, Status};

static V1_14: BuiltinTable = BuiltinTable {
	version: VersionTag::VILLAGE_UPDATE,
	directories: &[
		table(Handshaking, C2S, &[Row::packet("SET_PROTOCOL", "SetProtocol", 0x00, 0x00)]),
		table(Handshaking, S2C, &[]),
		table(Play, C2S, &[
			Row::packet("TELEPORT_ACCEPT", "TeleportAccept", 0x00, 0x00),
			Row::packet("TILE_NBT_QUERY", "TileNBTQuery", 0x01, 0x01),
			Row::packet("DIFFICULTY_CHANGE", "DifficultyChange", 0x02, UNKNOWN_ID),
			Row::packet("CHAT", "Chat", 0x03, 0x02),
			Row::packet("CLIENT_COMMAND", "ClientCommand", 0x04, 0x03),
			Row::packet("SETTINGS", "Settings", 0x05, 0x04),
			Row::packet("TAB_COMPLETE", "TabComplete", 0x06, 0x05),
			Row::packet("TRANSACTION", "Transaction", 0x07, 0x06),
			Row::packet("ENCHANT_ITEM", "EnchantItem", 0x08, 0x07),
			Row::packet("WINDOW_CLICK", "WindowClick", 0x09, 0x08),
			Row::packet("CLOSE_WINDOW", "CloseWindow", 0x0A, 0x09),
			Row::packet("CUSTOM_PAYLOAD", "CustomPayload", 0x0B, 0x0A),
			Row::packet("B_EDIT", "BEdit", 0x0C, 0x0B),
			Row::packet("ENTITY_NBT_QUERY", "EntityNBTQuery", 0x0D, 0x0C),
			Row::packet("USE_ENTITY", "UseEntity", 0x0E, 0x0D),
			Row::packet("KEEP_ALIVE", "KeepAlive", 0x0F, 0x0E),
			Row::packet("DIFFICULTY_LOCK", "DifficultyLock", 0x10, UNKNOWN_ID),
			Row::packet("POSITION", "Position", 0x11, 0x10),
			Row::packet("POSITION_LOOK", "PositionLook", 0x12, 0x11),
			Row::packet("LOOK", "Look", 0x13, 0x12),
			Row::packet("FLYING", "Flying", 0x14, 0x0F),
			Row::packet("VEHICLE_MOVE", "VehicleMove", 0x15, 0x13),
			Row::packet("BOAT_MOVE", "BoatMove", 0x16, 0x14),
			Row::packet("PICK_ITEM", "PickItem", 0x17, 0x15),
			Row::packet("AUTO_RECIPE", "AutoRecipe", 0x18, 0x16),
			Row::packet("ABILITIES", "Abilities", 0x19, 0x17),
			Row::packet("BLOCK_DIG", "BlockDig", 0x1A, 0x18),
			Row::packet("ENTITY_ACTION", "EntityAction", 0x1B, 0x19),
			Row::packet("STEER_VEHICLE", "SteerVehicle", 0x1C, 0x1A),
			Row::packet("RECIPE_DISPLAYED", "RecipeDisplayed", 0x1D, 0x1B),
			Row::packet("ITEM_NAME", "ItemName", 0x1E, 0x1C),
			Row::packet("RESOURCE_PACK_STATUS", "ResourcePackStatus", 0x1F, 0x1D),
			Row::packet("ADVANCEMENTS", "Advancements", 0x20, 0x1E),
			Row::packet("TR_SEL", "TrSel", 0x21, 0x1F),
			Row::packet("BEACON", "Beacon", 0x22, 0x20),
			Row::packet("HELD_ITEM_SLOT", "HeldItemSlot", 0x23, 0x21),
			Row::packet("SET_COMMAND_BLOCK", "SetCommandBlock", 0x24, 0x22),
			Row::packet("SET_COMMAND_MINECART", "SetCommandMinecart", 0x25, 0x23),
			Row::packet("SET_CREATIVE_SLOT", "SetCreativeSlot", 0x26, 0x24),
			Row::packet("SET_JIGSAW", "SetJigsaw", 0x27, UNKNOWN_ID),
			Row::packet("STRUCT", "Struct", 0x28, 0x25),
			Row::packet("UPDATE_SIGN", "UpdateSign", 0x29, 0x26),
			Row::packet("ARM_ANIMATION", "ArmAnimation", 0x2A, 0x27),
			Row::packet("SPECTATE", "Spectate", 0x2B, 0x28),
			Row::packet("USE_ITEM", "UseItem", 0x2C, 0x29),
			Row::packet("BLOCK_PLACE", "BlockPlace", 0x2D, 0x2A),
		]),
		table(Play, S2C, &[
			Row::packet("SPAWN_ENTITY", "SpawnEntity", 0x00, 0x00),
			Row::packet("SPAWN_ENTITY_EXPERIENCE_ORB", "SpawnEntityExperienceOrb", 0x01, 0x01),
			Row::packet("SPAWN_ENTITY_WEATHER", "SpawnEntityWeather", 0x02, 0x02),
			Row::packet("SPAWN_ENTITY_LIVING", "SpawnEntityLiving", 0x03, 0x03),
			Row::packet("SPAWN_ENTITY_PAINTING", "SpawnEntityPainting", 0x04, 0x04),
			Row::packet("NAMED_ENTITY_SPAWN", "NamedEntitySpawn", 0x05, 0x05),
			Row::packet("ANIMATION", "Animation", 0x06, 0x06),
			Row::packet("STATISTIC", "Statistic", 0x07, 0x07),
			Row::packet("BLOCK_BREAK_ANIMATION", "BlockBreakAnimation", 0x08, 0x08),
			Row::packet("TILE_ENTITY_DATA", "TileEntityData", 0x09, 0x09),
			Row::packet("BLOCK_ACTION", "BlockAction", 0x0A, 0x0A),
			Row::packet("BLOCK_CHANGE", "BlockChange", 0x0B, 0x0B),
			Row::packet("BOSS", "Boss", 0x0C, 0x0C),
			Row::packet("SERVER_DIFFICULTY", "ServerDifficulty", 0x0D, 0x0D),
			Row::packet("CHAT", "Chat", 0x0E, 0x0E),
			Row::packet("MULTI_BLOCK_CHANGE", "MultiBlockChange", 0x0F, 0x0F),
			Row::packet("TAB_COMPLETE", "TabComplete", 0x10, 0x10),
			Row::packet("COMMANDS", "Commands", 0x11, 0x11),
			Row::packet("TRANSACTION", "Transaction", 0x12, 0x12),
			Row::packet("CLOSE_WINDOW", "CloseWindow", 0x13, 0x13),
			Row::packet("WINDOW_ITEMS", "WindowItems", 0x14, 0x15),
			Row::packet("WINDOW_DATA", "WindowData", 0x15, 0x16),
			Row::packet("SET_SLOT", "SetSlot", 0x16, 0x17),
			Row::packet("SET_COOLDOWN", "SetCooldown", 0x17, 0x18),
			Row::packet("CUSTOM_PAYLOAD", "CustomPayload", 0x18, 0x19),
			Row::packet("CUSTOM_SOUND_EFFECT", "CustomSoundEffect", 0x19, 0x1A),
			Row::packet("KICK_DISCONNECT", "KickDisconnect", 0x1A, 0x1B),
			Row::packet("ENTITY_STATUS", "EntityStatus", 0x1B, 0x1C),
			Row::packet("EXPLOSION", "Explosion", 0x1C, 0x1E),
			Row::packet("UNLOAD_CHUNK", "UnloadChunk", 0x1D, UNKNOWN_ID),
			Row::packet("GAME_STATE_CHANGE", "GameStateChange", 0x1E, 0x20),
			Row::packet("OPEN_WINDOW_HORSE", "OpenWindowHorse", 0x1F, 0x1F),
			Row::packet("KEEP_ALIVE", "KeepAlive", 0x20, 0x21),
			Row::packet("MAP_CHUNK", "MapChunk", 0x21, 0x22),
			Row::packet("WORLD_EVENT", "WorldEvent", 0x22, 0x23),
			Row::packet("WORLD_PARTICLES", "WorldParticles", 0x23, UNKNOWN_ID),
			Row::packet("LIGHT_UPDATE", "LightUpdate", 0x24, 0x24),
			Row::packet("LOGIN", "Login", 0x25, 0x25),
			Row::packet("MAP", "Map", 0x26, 0x26),
			Row::packet("OPEN_WINDOW_MERCHANT", "OpenWindowMerchant", 0x27, UNKNOWN_ID),
			Row::packet("REL_ENTITY_MOVE", "RelEntityMove", 0x28, 0x28),
			Row::packet("REL_ENTITY_MOVE_LOOK", "RelEntityMoveLook", 0x29, 0x29),
			Row::packet("ENTITY_LOOK", "EntityLook", 0x2A, 0x2A),
			Row::packet("ENTITY", "Entity", 0x2B, 0x27),
			Row::packet("VEHICLE_MOVE", "VehicleMove", 0x2C, 0x2B),
			Row::packet("OPEN_BOOK", "OpenBook", 0x2D, UNKNOWN_ID),
			Row::packet("OPEN_WINDOW", "OpenWindow", 0x2E, 0x14),
			Row::packet("OPEN_SIGN_EDITOR", "OpenSignEditor", 0x2F, 0x2C),
			Row::packet("AUTO_RECIPE", "AutoRecipe", 0x30, 0x2D),
			Row::packet("ABILITIES", "Abilities", 0x31, 0x2E),
			Row::packet("COMBAT_EVENT", "CombatEvent", 0x32, 0x2F),
			Row::packet("PLAYER_INFO", "PlayerInfo", 0x33, 0x30),
			Row::packet("LOOK_AT", "LookAt", 0x34, 0x31),
			Row::packet("POSITION", "Position", 0x35, 0x32),
			Row::packet("RECIPES", "Recipes", 0x36, 0x34),
			Row::packet("ENTITY_DESTROY", "EntityDestroy", 0x37, 0x35),
			Row::packet("REMOVE_ENTITY_EFFECT", "RemoveEntityEffect", 0x38, 0x36),
			Row::packet("RESOURCE_PACK_SEND", "ResourcePackSend", 0x39, 0x37),
			Row::packet("RESPAWN", "Respawn", 0x3A, 0x38),
			Row::packet("ENTITY_HEAD_ROTATION", "EntityHeadRotation", 0x3B, 0x39),
			Row::packet("SELECT_ADVANCEMENT_TAB", "SelectAdvancementTab", 0x3C, 0x3A),
			Row::packet("WORLD_BORDER", "WorldBorder", 0x3D, 0x3B),
			Row::packet("CAMERA", "Camera", 0x3E, 0x3C),
			Row::packet("HELD_ITEM_SLOT", "HeldItemSlot", 0x3F, 0x3D),
			Row::packet("VIEW_CENTRE", "ViewCentre", 0x40, UNKNOWN_ID),
			Row::packet("VIEW_DISTANCE", "ViewDistance", 0x41, UNKNOWN_ID),
			Row::packet("SCOREBOARD_DISPLAY_OBJECTIVE", "ScoreboardDisplayObjective", 0x42, 0x3E),
			Row::packet("ENTITY_METADATA", "EntityMetadata", 0x43, 0x3F),
			Row::packet("ATTACH_ENTITY", "AttachEntity", 0x44, 0x40),
			Row::packet("ENTITY_VELOCITY", "EntityVelocity", 0x45, 0x41),
			Row::packet("ENTITY_EQUIPMENT", "EntityEquipment", 0x46, 0x42),
			Row::packet("EXPERIENCE", "Experience", 0x47, 0x43),
			Row::packet("UPDATE_HEALTH", "UpdateHealth", 0x48, 0x44),
			Row::packet("SCOREBOARD_OBJECTIVE", "ScoreboardObjective", 0x49, 0x45),
			Row::packet("MOUNT", "Mount", 0x4A, 0x46),
			Row::packet("SCOREBOARD_TEAM", "ScoreboardTeam", 0x4B, 0x47),
			Row::packet("SCOREBOARD_SCORE", "ScoreboardScore", 0x4C, 0x48),
			Row::packet("SPAWN_POSITION", "SpawnPosition", 0x4D, 0x49),
			Row::packet("UPDATE_TIME", "UpdateTime", 0x4E, 0x4A),
			Row::packet("TITLE", "Title", 0x4F, 0x4B),
			Row::packet("ENTITY_SOUND", "EntitySound", 0x50, UNKNOWN_ID),
			Row::packet("NAMED_SOUND_EFFECT", "NamedSoundEffect", 0x51, 0x4D),
			Row::packet("STOP_SOUND", "StopSound", 0x52, 0x4C),
			Row::packet("PLAYER_LIST_HEADER_FOOTER", "PlayerListHeaderFooter", 0x53, 0x4E),
			Row::packet("NBT_QUERY", "NBTQuery", 0x54, 0x1D),
			Row::packet("COLLECT", "Collect", 0x55, 0x4F),
			Row::packet("ENTITY_TELEPORT", "EntityTeleport", 0x56, 0x50),
			Row::packet("ADVANCEMENTS", "Advancements", 0x57, 0x51),
			Row::packet("UPDATE_ATTRIBUTES", "UpdateAttributes", 0x58, 0x52),
			Row::packet("ENTITY_EFFECT", "EntityEffect", 0x59, 0x53),
			Row::packet("RECIPE_UPDATE", "RecipeUpdate", 0x5A, 0x54),
			Row::packet("TAGS", "Tags", 0x5B, 0x55),
			Row::packet("BLOCK_BREAK", "BlockBreak", 0x5C, 0x5C),
			// Removed in 1.9.
			Row::removed("MAP_CHUNK_BULK", "MapChunkBulk", 255),
			Row::removed("SET_COMPRESSION", "SetCompression", 254),
			Row::removed("UPDATE_ENTITY_NBT", "UpdateEntityNBT", 253),
			// Removed in 1.14; its last id now belongs to PLAYER_INFO.
			Row::removed("USE_BED", "UseBed", 0x33),
			Row::renamed("CRAFT_PROGRESS_BAR", "WINDOW_DATA"),
			Row::renamed("ENTITY_MOVE_LOOK", "REL_ENTITY_MOVE_LOOK"),
			Row::renamed("STATISTICS", "STATISTIC"),
			Row::renamed("OPEN_SIGN_ENTITY", "OPEN_SIGN_EDITOR"),
			Row::renamed("UPDATE_SIGN", "TILE_ENTITY_DATA"),
		]),
		table(Status, C2S, &[
			Row::packet("START", "Start", 0x00, 0x00),
			Row::packet("PING", "Ping", 0x01, 0x01),
		]),
		table(Status, S2C, &[
			Row::packet("SERVER_INFO", "ServerInfo", 0x00, 0x00).forced_async(),
			Row::packet("PONG", "Pong", 0x01, 0x01),
			Row::renamed("OUT_SERVER_INFO", "SERVER_INFO"),
		]),
		table(Login, C2S, &[
			Row::packet("START", "Start", 0x00, 0x00),
			Row::packet("ENCRYPTION_BEGIN", "EncryptionBegin", 0x01, 0x01),
			Row::packet("CUSTOM_PAYLOAD", "CustomPayload", 0x02, UNKNOWN_ID),
		]),
		table(Login, S2C, &[
			Row::packet("DISCONNECT", "Disconnect", 0x00, 0x00),
			Row::packet("ENCRYPTION_BEGIN", "EncryptionBegin", 0x01, 0x01),
			Row::packet("SUCCESS", "Success", 0x02, 0x02),
			Row::packet("SET_COMPRESSION", "SetCompression", 0x03, 0x03),
			Row::packet("CUSTOM_PAYLOAD", "CustomPayload", 0x04, UNKNOWN_ID),
		]),
		table(Legacy, C2S, &[
			Row::legacy("LOGIN", "Login", 1),
			Row::legacy("RESPAWN", "Respawn", 9),
			Row::legacy("DISCONNECT", "Disconnect", 255),
		]),
		table(Legacy, S2C, &[
			Row::legacy("PLAYER_FLYING", "PlayerFlying", 10),
			Row::legacy("PLAYER_POSITION", "PlayerPosition", 11),
			Row::legacy("PLAYER_POSITON_LOOK", "PlayerPositionLook", 12),
			// Removed in 1.4.6.
			Row::legacy("PICKUP_SPAWN", "PickupSpawn", 21),
			// Removed in 1.7.2.
			Row::legacy("SET_CREATIVE_SLOT", "SetCreativeSlot", 107),
			Row::legacy("KEY_RESPONSE", "KeyResponse", 252),
		]),
	],
};
