//! Initial migration: input images, block catalogue/instances, and the cache index.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
	async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
		manager
			.create_table(
				Table::create()
					.table(InputImages::Table)
					.if_not_exists()
					.col(
						ColumnDef::new(InputImages::Uuid)
							.uuid()
							.not_null()
							.primary_key(),
					)
					.col(ColumnDef::new(InputImages::OriginalFilename).string().not_null())
					.col(
						ColumnDef::new(InputImages::UploadTimestamp)
							.timestamp_with_time_zone()
							.not_null(),
					)
					.to_owned(),
			)
			.await?;

		manager
			.create_table(
				Table::create()
					.table(BlocksCatalogue::Table)
					.if_not_exists()
					.col(
						ColumnDef::new(BlocksCatalogue::Id)
							.integer()
							.not_null()
							.primary_key(),
					)
					.col(ColumnDef::new(BlocksCatalogue::Name).string().not_null())
					.col(ColumnDef::new(BlocksCatalogue::Command).string().not_null())
					.col(
						ColumnDef::new(BlocksCatalogue::ParameterTemplate)
							.string()
							.not_null(),
					)
					.col(
						ColumnDef::new(BlocksCatalogue::ParameterMappings)
							.json()
							.not_null(),
					)
					.col(ColumnDef::new(BlocksCatalogue::GuiFields).json().not_null())
					.col(ColumnDef::new(BlocksCatalogue::Outputs).json())
					.to_owned(),
			)
			.await?;

		manager
			.create_table(
				Table::create()
					.table(Blocks::Table)
					.if_not_exists()
					.col(
						ColumnDef::new(Blocks::Id)
							.integer()
							.not_null()
							.auto_increment()
							.primary_key(),
					)
					.col(ColumnDef::new(Blocks::Idproject).integer().not_null())
					.col(ColumnDef::new(Blocks::Idblock).integer().not_null())
					.col(ColumnDef::new(Blocks::Connections).json().not_null())
					.col(ColumnDef::new(Blocks::OutputValue).json().not_null())
					.col(ColumnDef::new(Blocks::Enabled).boolean())
					.foreign_key(
						ForeignKey::create()
							.from(Blocks::Table, Blocks::Idblock)
							.to(BlocksCatalogue::Table, BlocksCatalogue::Id),
					)
					.to_owned(),
			)
			.await?;

		manager
			.create_index(
				Index::create()
					.name("idx_blocks_idproject")
					.table(Blocks::Table)
					.col(Blocks::Idproject)
					.to_owned(),
			)
			.await?;

		manager
			.create_table(
				Table::create()
					.table(ImageCache::Table)
					.if_not_exists()
					.col(
						ColumnDef::new(ImageCache::Uuid)
							.uuid()
							.not_null()
							.primary_key(),
					)
					.col(ColumnDef::new(ImageCache::Idblock).integer().not_null())
					.col(ColumnDef::new(ImageCache::ParametersJson).string().not_null())
					.col(
						ColumnDef::new(ImageCache::InputUuidsJson)
							.string()
							.not_null(),
					)
					.col(
						ColumnDef::new(ImageCache::CreationTimestamp)
							.timestamp_with_time_zone()
							.not_null(),
					)
					.to_owned(),
			)
			.await?;

		// Consult index: (idblock, parameters_json, input_uuids_json).
		manager
			.create_index(
				Index::create()
					.name("idx_image_cache_key")
					.table(ImageCache::Table)
					.col(ImageCache::Idblock)
					.col(ImageCache::ParametersJson)
					.col(ImageCache::InputUuidsJson)
					.to_owned(),
			)
			.await?;

		Ok(())
	}

	async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
		manager
			.drop_table(Table::drop().table(ImageCache::Table).to_owned())
			.await?;
		manager
			.drop_table(Table::drop().table(Blocks::Table).to_owned())
			.await?;
		manager
			.drop_table(Table::drop().table(BlocksCatalogue::Table).to_owned())
			.await?;
		manager
			.drop_table(Table::drop().table(InputImages::Table).to_owned())
			.await?;
		Ok(())
	}
}

#[derive(DeriveIden)]
enum InputImages {
	Table,
	Uuid,
	OriginalFilename,
	UploadTimestamp,
}

#[derive(DeriveIden)]
enum BlocksCatalogue {
	Table,
	Id,
	Name,
	Command,
	ParameterTemplate,
	ParameterMappings,
	GuiFields,
	Outputs,
}

#[derive(DeriveIden)]
enum Blocks {
	Table,
	Id,
	Idproject,
	Idblock,
	Connections,
	OutputValue,
	Enabled,
}

#[derive(DeriveIden)]
enum ImageCache {
	Table,
	Uuid,
	Idblock,
	ParametersJson,
	InputUuidsJson,
	CreationTimestamp,
}
